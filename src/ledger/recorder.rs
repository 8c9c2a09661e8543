//! Payment posting against invoices

use crate::config::LedgerConfig;
use crate::core::validation::validate_payment_amount;
use crate::core::{
    Invoice, LedgerError, LedgerResult, Payment, PaymentMethod, StorageError,
};
use crate::sequence::SequenceAllocator;
use crate::storage::LedgerStorage;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const PAYMENT_SEQUENCE: &str = "payment";

/// Validates and posts payments, keeping each invoice's paid total equal to
/// the sum of its committed payments after every operation.
///
/// The read-check-write on the invoice is serialized through the storage
/// layer's compare-and-set: a writer that raced and lost reloads the fresh
/// total, re-runs the overpayment check against it, and tries again. Two
/// concurrent payments whose combined total would overshoot can therefore
/// never both commit; the loser sees `Overpayment`.
pub struct PaymentRecorder {
    storage: Arc<dyn LedgerStorage>,
    sequences: Arc<SequenceAllocator>,
    config: Arc<LedgerConfig>,
}

impl PaymentRecorder {
    pub fn new(
        storage: Arc<dyn LedgerStorage>,
        sequences: Arc<SequenceAllocator>,
        config: Arc<LedgerConfig>,
    ) -> Self {
        Self {
            storage,
            sequences,
            config,
        }
    }

    /// Post a payment against an invoice.
    ///
    /// Validation and the overpayment check run before the payment sequence
    /// is touched; a rejected payment performs no mutation at all. On
    /// success the payment row and the updated invoice (paid total, derived
    /// status, advanced version) are committed in one atomic step.
    pub async fn record_payment(
        &self,
        invoice_id: &Uuid,
        amount_paid: Decimal,
        method: PaymentMethod,
    ) -> LedgerResult<Payment> {
        validate_payment_amount(amount_paid)?;

        let mut invoice = self.load_invoice(invoice_id).await?;
        self.check_overpayment(&invoice, amount_paid)?;

        let code = self.sequences.allocate(PAYMENT_SEQUENCE).await?;

        let mut attempt = 0;
        loop {
            let payment = Payment::new(code.clone(), invoice.id, amount_paid, method);
            let updated = invoice.with_payment(amount_paid);

            match self
                .storage
                .commit_payment(updated.clone(), payment.clone(), invoice.version)
                .await
            {
                Ok(_) => {
                    tracing::info!(
                        code = %payment.code,
                        invoice = %invoice.code,
                        %amount_paid,
                        %method,
                        status = %updated.status,
                        "payment recorded"
                    );
                    return Ok(payment);
                }
                Err(StorageError::VersionConflict { .. })
                    if attempt + 1 < self.config.retry.max_attempts =>
                {
                    attempt += 1;
                    tracing::debug!(
                        invoice = %invoice.code,
                        attempt,
                        "payment commit contention, reloading invoice"
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry.backoff_ms)).await;
                    invoice = self.load_invoice(invoice_id).await?;
                    // The fresh total may already leave no room for this payment.
                    self.check_overpayment(&invoice, amount_paid)?;
                }
                Err(StorageError::VersionConflict { .. }) => {
                    return Err(StorageError::unavailable(
                        "payment commit contention exceeded retry bound",
                    )
                    .into());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn load_invoice(&self, id: &Uuid) -> LedgerResult<Invoice> {
        self.storage
            .get_invoice(id)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "invoice",
                id: id.to_string(),
            })
    }

    fn check_overpayment(&self, invoice: &Invoice, amount: Decimal) -> LedgerResult<()> {
        if invoice.amount_paid + amount > invoice.amount_due {
            return Err(LedgerError::Overpayment {
                invoice_id: invoice.id,
                attempted: amount,
                amount_due: invoice.amount_due,
                amount_paid: invoice.amount_paid,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Domain, InvoiceStatus};
    use crate::ledger::LedgerStore;
    use crate::storage::InMemoryLedgerStorage;
    use futures::future::join_all;
    use rust_decimal_macros::dec;

    fn services() -> (LedgerStore, PaymentRecorder) {
        let storage: Arc<dyn LedgerStorage> = Arc::new(InMemoryLedgerStorage::new());
        let config = Arc::new(LedgerConfig::default_config());
        let sequences = Arc::new(SequenceAllocator::new(
            Arc::clone(&storage),
            Arc::clone(&config),
        ));
        (
            LedgerStore::new(Arc::clone(&storage), Arc::clone(&sequences)),
            PaymentRecorder::new(storage, sequences, config),
        )
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let (store, recorder) = services();
        let invoice = store
            .create_invoice("P", "2024-05", Domain::Rent, dec!(900))
            .await
            .unwrap();

        let first = recorder
            .record_payment(&invoice.id, dec!(300), PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(first.code, "PAY001");

        let after_first = store.get_invoice(&invoice.id).await.unwrap();
        assert_eq!(after_first.amount_paid, dec!(300));
        assert_eq!(after_first.status, InvoiceStatus::PartiallyPaid);

        recorder
            .record_payment(&invoice.id, dec!(600), PaymentMethod::BankTransfer)
            .await
            .unwrap();

        let settled = store.get_invoice(&invoice.id).await.unwrap();
        assert_eq!(settled.amount_paid, dec!(900));
        assert_eq!(settled.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_paid_total_equals_payment_sum() {
        let (store, recorder) = services();
        let invoice = store
            .create_invoice("P", "2024-05", Domain::Meal, dec!(100))
            .await
            .unwrap();

        for amount in [dec!(10), dec!(25.50), dec!(14.50)] {
            recorder
                .record_payment(&invoice.id, amount, PaymentMethod::Card)
                .await
                .unwrap();
        }

        let stored = store.get_invoice(&invoice.id).await.unwrap();
        let payments = store.invoice_payments(&invoice.id).await.unwrap();
        let sum: Decimal = payments.iter().map(|p| p.amount_paid).sum();
        assert_eq!(stored.amount_paid, sum);
        assert_eq!(sum, dec!(50));
    }

    #[tokio::test]
    async fn test_overpayment_rejected_without_mutation() {
        let (store, recorder) = services();
        let invoice = store
            .create_invoice("P", "2024-05", Domain::Rent, dec!(1000))
            .await
            .unwrap();

        recorder
            .record_payment(&invoice.id, dec!(1000), PaymentMethod::Online)
            .await
            .unwrap();
        let paid = store.get_invoice(&invoice.id).await.unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);

        let err = recorder
            .record_payment(&invoice.id, dec!(1), PaymentMethod::Online)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Overpayment { .. }));

        let unchanged = store.get_invoice(&invoice.id).await.unwrap();
        assert_eq!(unchanged.amount_paid, dec!(1000));
        assert_eq!(
            store.invoice_payments(&invoice.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let (store, recorder) = services();
        let invoice = store
            .create_invoice("P", "2024-05", Domain::Rent, dec!(100))
            .await
            .unwrap();

        let err = recorder
            .record_payment(&invoice.id, dec!(0), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_invoice_is_not_found() {
        let (_, recorder) = services();
        let err = recorder
            .record_payment(&Uuid::new_v4(), dec!(10), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_payments_never_overshoot() {
        let (store, recorder) = services();
        let recorder = Arc::new(recorder);
        let invoice = store
            .create_invoice("P", "2024-05", Domain::Rent, dec!(1000))
            .await
            .unwrap();

        // Two writers race for the last 1000 of headroom; 600 + 600 > 1000,
        // so exactly one may win.
        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                let id = invoice.id;
                tokio::spawn(async move {
                    recorder
                        .record_payment(&id, dec!(600), PaymentMethod::Card)
                        .await
                })
            })
            .collect();
        let outcomes: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|res| res.unwrap())
            .collect();

        let successes = outcomes.iter().filter(|o| o.is_ok()).count();
        let overpayments = outcomes
            .iter()
            .filter(|o| matches!(o, Err(LedgerError::Overpayment { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(overpayments, 1);

        let stored = store.get_invoice(&invoice.id).await.unwrap();
        assert_eq!(stored.amount_paid, dec!(600));
        assert_eq!(stored.status, InvoiceStatus::PartiallyPaid);
    }
}
