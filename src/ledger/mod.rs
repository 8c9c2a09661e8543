//! Ledger services: invoice creation and payment recording
//!
//! [`LedgerStore`] exclusively owns invoice writes; [`recorder::PaymentRecorder`]
//! exclusively owns payment posting. Both validate before any side effect and
//! lean on the storage layer's atomic primitives for their consistency
//! guarantees.

pub mod recorder;

pub use recorder::PaymentRecorder;

use crate::core::validation::{validate_amount_due, validate_month, validate_property_id};
use crate::core::{Domain, Invoice, LedgerError, LedgerResult, Payment, StorageError};
use crate::sequence::SequenceAllocator;
use crate::storage::LedgerStorage;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Sequence key shared by all invoice domains. Domain-qualified keys (e.g.
/// "invoice:rent") would be a configuration change, not a code change, but
/// this crate deliberately numbers all invoices from one sequence.
const INVOICE_SEQUENCE: &str = "invoice";

/// Durable record of invoices and their payments.
pub struct LedgerStore {
    storage: Arc<dyn LedgerStorage>,
    sequences: Arc<SequenceAllocator>,
}

impl LedgerStore {
    pub fn new(storage: Arc<dyn LedgerStorage>, sequences: Arc<SequenceAllocator>) -> Self {
        Self { storage, sequences }
    }

    /// Create an invoice for a property/month/domain.
    ///
    /// Validation and the cardinality check run before the sequence is
    /// touched, so rejected requests never burn a code. The storage insert
    /// re-enforces the period constraint atomically; a concurrent duplicate
    /// that slips past the pre-check still fails with `DuplicatePeriod`.
    pub async fn create_invoice(
        &self,
        property_id: &str,
        month: &str,
        domain: Domain,
        amount_due: Decimal,
    ) -> LedgerResult<Invoice> {
        validate_property_id(property_id)?;
        validate_month(month)?;
        validate_amount_due(amount_due)?;

        if !domain.allows_multiple_per_period()
            && self
                .storage
                .find_invoice_for_period(property_id, month, domain)
                .await?
                .is_some()
        {
            return Err(self.duplicate_period(property_id, month, domain));
        }

        let code = self.sequences.allocate(INVOICE_SEQUENCE).await?;
        let invoice = Invoice::new(
            code,
            property_id.to_string(),
            month.to_string(),
            domain,
            amount_due,
        );

        let invoice = match self.storage.insert_invoice(invoice).await {
            Ok(invoice) => invoice,
            Err(StorageError::UniqueViolation {
                constraint: "invoice_period",
            }) => return Err(self.duplicate_period(property_id, month, domain)),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            code = %invoice.code,
            property_id,
            month,
            %domain,
            %amount_due,
            "invoice created"
        );
        Ok(invoice)
    }

    /// Fetch an invoice by id.
    pub async fn get_invoice(&self, id: &Uuid) -> LedgerResult<Invoice> {
        self.storage
            .get_invoice(id)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "invoice",
                id: id.to_string(),
            })
    }

    /// Payments posted against an invoice, most recent first. Explicit query
    /// in place of any implicit invoice→payments population.
    pub async fn invoice_payments(&self, id: &Uuid) -> LedgerResult<Vec<Payment>> {
        // Missing invoice is NotFound, not an empty list.
        self.get_invoice(id).await?;
        Ok(self.storage.list_payments_for_invoice(id).await?)
    }

    fn duplicate_period(&self, property_id: &str, month: &str, domain: Domain) -> LedgerError {
        LedgerError::DuplicatePeriod {
            property_id: property_id.to_string(),
            month: month.to_string(),
            domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::core::InvoiceStatus;
    use crate::storage::InMemoryLedgerStorage;
    use rust_decimal_macros::dec;

    fn store() -> LedgerStore {
        let storage: Arc<dyn LedgerStorage> = Arc::new(InMemoryLedgerStorage::new());
        let config = Arc::new(LedgerConfig::default_config());
        let sequences = Arc::new(SequenceAllocator::new(Arc::clone(&storage), config));
        LedgerStore::new(storage, sequences)
    }

    #[tokio::test]
    async fn test_create_invoice_mints_code_and_starts_unpaid() {
        let store = store();

        let invoice = store
            .create_invoice("prop-1", "2024-05", Domain::Rent, dec!(1200))
            .await
            .unwrap();

        assert_eq!(invoice.code, "INV001");
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert_eq!(invoice.amount_paid, dec!(0));

        let fetched = store.get_invoice(&invoice.id).await.unwrap();
        assert_eq!(fetched.code, invoice.code);
    }

    #[tokio::test]
    async fn test_create_invoice_rejects_bad_month() {
        let store = store();
        let err = store
            .create_invoice("prop-1", "2024-13", Domain::Rent, dec!(100))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_invoice_rejects_negative_amount() {
        let store = store();
        let err = store
            .create_invoice("prop-1", "2024-05", Domain::Rent, dec!(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_duplicate_utility_period_rejected() {
        let store = store();

        store
            .create_invoice("P", "2024-05", Domain::Utility, dec!(80))
            .await
            .unwrap();

        let err = store
            .create_invoice("P", "2024-05", Domain::Utility, dec!(90))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicatePeriod { .. }));
    }

    #[tokio::test]
    async fn test_meal_invoices_accumulate_in_one_period() {
        let store = store();

        let first = store
            .create_invoice("P", "2024-05", Domain::Meal, dec!(15))
            .await
            .unwrap();
        let second = store
            .create_invoice("P", "2024-05", Domain::Meal, dec!(20))
            .await
            .unwrap();
        assert_ne!(first.code, second.code);
    }

    #[tokio::test]
    async fn test_same_period_different_property_is_fine() {
        let store = store();

        store
            .create_invoice("P1", "2024-05", Domain::Rent, dec!(1000))
            .await
            .unwrap();
        store
            .create_invoice("P2", "2024-05", Domain::Rent, dec!(1100))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_invoice_burns_no_code() {
        let store = store();

        store
            .create_invoice("P", "2024-05", Domain::Utility, dec!(80))
            .await
            .unwrap();
        let _ = store
            .create_invoice("P", "2024-05", Domain::Utility, dec!(80))
            .await
            .unwrap_err();

        let next = store
            .create_invoice("P", "2024-06", Domain::Utility, dec!(80))
            .await
            .unwrap();
        assert_eq!(next.code, "INV002");
    }

    #[tokio::test]
    async fn test_get_missing_invoice_is_not_found() {
        let store = store();
        let err = store.get_invoice(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_payments_for_missing_invoice_is_not_found() {
        let store = store();
        let err = store.invoice_payments(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
