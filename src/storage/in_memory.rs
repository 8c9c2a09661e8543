//! In-memory implementation of LedgerStorage for testing and development
//!
//! Every trait call takes the lock once, so each operation is atomic with
//! respect to every other. That single-lock scope is what serializes the
//! counter increment and the invoice compare-and-set. Reads clone out of the
//! map; reports built from those clones may trail a concurrent payment by a
//! moment, which the aggregator accepts.

use crate::core::{
    Counter, Domain, Invoice, Payment, Report, ReportFilter, ReportType, StorageError,
};
use crate::storage::LedgerStorage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    counters: HashMap<String, Counter>,
    invoices: HashMap<Uuid, Invoice>,
    payments: HashMap<Uuid, Payment>,
    reports: HashMap<(ReportType, String), Report>,
}

/// In-memory ledger storage. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStorage {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryLedgerStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>, StorageError> {
        self.collections
            .read()
            .map_err(|_| StorageError::unavailable("storage lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collections>, StorageError> {
        self.collections
            .write()
            .map_err(|_| StorageError::unavailable("storage lock poisoned"))
    }
}

#[async_trait]
impl LedgerStorage for InMemoryLedgerStorage {
    async fn allocate_seq(
        &self,
        key: &str,
        prefix: &str,
        pad: usize,
    ) -> Result<Counter, StorageError> {
        let mut collections = self.write()?;

        let counter = collections
            .counters
            .entry(key.to_string())
            .or_insert_with(|| Counter::new(key.to_string(), prefix.to_string(), pad));
        counter.advance();

        Ok(counter.clone())
    }

    async fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, StorageError> {
        let mut collections = self.write()?;

        if collections
            .invoices
            .values()
            .any(|existing| existing.code == invoice.code)
        {
            return Err(StorageError::UniqueViolation {
                constraint: "invoice_code",
            });
        }

        if !invoice.domain.allows_multiple_per_period()
            && collections.invoices.values().any(|existing| {
                existing.property_id == invoice.property_id
                    && existing.month == invoice.month
                    && existing.domain == invoice.domain
            })
        {
            return Err(StorageError::UniqueViolation {
                constraint: "invoice_period",
            });
        }

        collections.invoices.insert(invoice.id, invoice.clone());

        Ok(invoice)
    }

    async fn get_invoice(&self, id: &Uuid) -> Result<Option<Invoice>, StorageError> {
        let collections = self.read()?;

        Ok(collections.invoices.get(id).cloned())
    }

    async fn find_invoice_for_period(
        &self,
        property_id: &str,
        month: &str,
        domain: Domain,
    ) -> Result<Option<Invoice>, StorageError> {
        let collections = self.read()?;

        Ok(collections
            .invoices
            .values()
            .find(|invoice| {
                invoice.property_id == property_id
                    && invoice.month == month
                    && invoice.domain == domain
            })
            .cloned())
    }

    async fn list_invoices_for_month(
        &self,
        month: &str,
        domain: Option<Domain>,
    ) -> Result<Vec<Invoice>, StorageError> {
        let collections = self.read()?;

        let mut invoices: Vec<Invoice> = collections
            .invoices
            .values()
            .filter(|invoice| {
                invoice.month == month && domain.is_none_or(|d| invoice.domain == d)
            })
            .cloned()
            .collect();
        invoices.sort_by(|a, b| a.code.cmp(&b.code));

        Ok(invoices)
    }

    async fn commit_payment(
        &self,
        invoice: Invoice,
        payment: Payment,
        expected_version: u64,
    ) -> Result<Invoice, StorageError> {
        let mut collections = self.write()?;

        match collections.invoices.get(&invoice.id) {
            Some(stored) if stored.version == expected_version => {}
            _ => {
                return Err(StorageError::VersionConflict {
                    entity: "invoice",
                    id: invoice.id,
                });
            }
        }

        if collections
            .payments
            .values()
            .any(|existing| existing.code == payment.code && existing.id != payment.id)
        {
            return Err(StorageError::UniqueViolation {
                constraint: "payment_code",
            });
        }

        collections.payments.insert(payment.id, payment);
        collections.invoices.insert(invoice.id, invoice.clone());

        Ok(invoice)
    }

    async fn list_payments_for_invoice(
        &self,
        invoice_id: &Uuid,
    ) -> Result<Vec<Payment>, StorageError> {
        let collections = self.read()?;

        let mut payments: Vec<Payment> = collections
            .payments
            .values()
            .filter(|payment| &payment.invoice_id == invoice_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));

        Ok(payments)
    }

    async fn upsert_report(&self, mut report: Report) -> Result<Report, StorageError> {
        let mut collections = self.write()?;

        let key = (report.report_type, report.month.clone());
        if let Some(existing) = collections.reports.get(&key) {
            report.id = existing.id;
        }
        collections.reports.insert(key, report.clone());

        Ok(report)
    }

    async fn get_report(&self, id: &Uuid) -> Result<Option<Report>, StorageError> {
        let collections = self.read()?;

        Ok(collections
            .reports
            .values()
            .find(|report| &report.id == id)
            .cloned())
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, StorageError> {
        let collections = self.read()?;

        let mut reports: Vec<Report> = collections
            .reports
            .values()
            .filter(|report| {
                filter
                    .report_type
                    .is_none_or(|rt| report.report_type == rt)
                    && filter
                        .month
                        .as_deref()
                        .is_none_or(|m| report.month == m)
            })
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));

        Ok(reports)
    }
}
