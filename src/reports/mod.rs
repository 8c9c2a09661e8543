//! Monthly report aggregation
//!
//! [`ReportAggregator`] exclusively owns report writes and only ever reads
//! invoices and payments. Aggregation is a best-effort snapshot: reads are
//! not synchronized with concurrent payment writers, and a report may trail
//! a just-committed payment. Running it again with an unchanged ledger
//! produces identical data.

pub mod export;

pub use export::{ExportFormat, ExportedReport};

use crate::core::validation::validate_month;
use crate::core::{
    LedgerError, LedgerResult, PropertyTotals, Report, ReportData, ReportFilter, ReportType,
};
use crate::storage::LedgerStorage;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Builds and persists one aggregate snapshot per (report type, month).
pub struct ReportAggregator {
    storage: Arc<dyn LedgerStorage>,
}

impl ReportAggregator {
    pub fn new(storage: Arc<dyn LedgerStorage>) -> Self {
        Self { storage }
    }

    /// Aggregate the scope and upsert its report.
    ///
    /// Collected figures are summed over the payment rows referencing the
    /// scoped invoices, not the invoices' cached paid totals, so the report
    /// measures the ledger's own books. The per-property breakdown is keyed
    /// through a BTreeMap, which keeps regeneration deterministic.
    pub async fn generate_report(
        &self,
        report_type: ReportType,
        month: &str,
        notes: Option<String>,
    ) -> LedgerResult<Report> {
        validate_month(month)?;

        let invoices = self
            .storage
            .list_invoices_for_month(month, report_type.domain())
            .await?;

        let mut per_property: BTreeMap<String, PropertyTotals> = BTreeMap::new();
        let mut payment_count = 0usize;

        for invoice in &invoices {
            let payments = self.storage.list_payments_for_invoice(&invoice.id).await?;
            let collected: Decimal = payments.iter().map(|p| p.amount_paid).sum();
            payment_count += payments.len();

            let entry = per_property
                .entry(invoice.property_id.clone())
                .or_insert_with(|| PropertyTotals {
                    property_id: invoice.property_id.clone(),
                    invoiced: Decimal::ZERO,
                    collected: Decimal::ZERO,
                    outstanding: Decimal::ZERO,
                });
            entry.invoiced += invoice.amount_due;
            entry.collected += collected;
            entry.outstanding = entry.invoiced - entry.collected;
        }

        let total_invoiced: Decimal = per_property.values().map(|p| p.invoiced).sum();
        let total_collected: Decimal = per_property.values().map(|p| p.collected).sum();

        let data = ReportData {
            report_type,
            month: month.to_string(),
            total_invoiced,
            total_collected,
            outstanding: total_invoiced - total_collected,
            invoice_count: invoices.len(),
            payment_count,
            properties: per_property.into_values().collect(),
            notes,
        };

        let report = self
            .storage
            .upsert_report(Report::new(report_type, month.to_string(), data))
            .await?;

        tracing::info!(
            %report_type,
            month,
            invoices = report.data.invoice_count,
            %total_invoiced,
            %total_collected,
            "report generated"
        );
        Ok(report)
    }

    /// Fetch a report by id.
    pub async fn get_report(&self, id: &Uuid) -> LedgerResult<Report> {
        self.storage
            .get_report(id)
            .await?
            .ok_or(LedgerError::NotFound {
                entity: "report",
                id: id.to_string(),
            })
    }

    /// Reports matching the filter, most recently generated first.
    pub async fn list_reports(&self, filter: &ReportFilter) -> LedgerResult<Vec<Report>> {
        Ok(self.storage.list_reports(filter).await?)
    }

    /// Serialize a report in the requested format.
    pub async fn export_report(&self, id: &Uuid, format: &str) -> LedgerResult<ExportedReport> {
        let format = ExportFormat::parse(format).ok_or_else(|| LedgerError::UnsupportedFormat {
            format: format.to_string(),
        })?;
        let report = self.get_report(id).await?;
        export::render(&report, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::core::{Domain, PaymentMethod};
    use crate::ledger::{LedgerStore, PaymentRecorder};
    use crate::sequence::SequenceAllocator;
    use crate::storage::InMemoryLedgerStorage;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: LedgerStore,
        recorder: PaymentRecorder,
        aggregator: ReportAggregator,
    }

    fn fixture() -> Fixture {
        let storage: Arc<dyn LedgerStorage> = Arc::new(InMemoryLedgerStorage::new());
        let config = Arc::new(LedgerConfig::default_config());
        let sequences = Arc::new(SequenceAllocator::new(
            Arc::clone(&storage),
            Arc::clone(&config),
        ));
        Fixture {
            store: LedgerStore::new(Arc::clone(&storage), Arc::clone(&sequences)),
            recorder: PaymentRecorder::new(
                Arc::clone(&storage),
                sequences,
                config,
            ),
            aggregator: ReportAggregator::new(storage),
        }
    }

    async fn seed_month(fix: &Fixture) {
        let rent_a = fix
            .store
            .create_invoice("prop-a", "2024-05", Domain::Rent, dec!(1000))
            .await
            .unwrap();
        let rent_b = fix
            .store
            .create_invoice("prop-b", "2024-05", Domain::Rent, dec!(800))
            .await
            .unwrap();
        fix.store
            .create_invoice("prop-a", "2024-05", Domain::Meal, dec!(120))
            .await
            .unwrap();

        fix.recorder
            .record_payment(&rent_a.id, dec!(400), PaymentMethod::BankTransfer)
            .await
            .unwrap();
        fix.recorder
            .record_payment(&rent_a.id, dec!(600), PaymentMethod::Cash)
            .await
            .unwrap();
        fix.recorder
            .record_payment(&rent_b.id, dec!(300), PaymentMethod::Card)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rent_report_totals_and_breakdown() {
        let fix = fixture();
        seed_month(&fix).await;

        let report = fix
            .aggregator
            .generate_report(ReportType::Rent, "2024-05", None)
            .await
            .unwrap();

        assert_eq!(report.data.total_invoiced, dec!(1800));
        assert_eq!(report.data.total_collected, dec!(1300));
        assert_eq!(report.data.outstanding, dec!(500));
        assert_eq!(report.data.invoice_count, 2);
        assert_eq!(report.data.payment_count, 3);

        assert_eq!(report.data.properties.len(), 2);
        let prop_a = &report.data.properties[0];
        assert_eq!(prop_a.property_id, "prop-a");
        assert_eq!(prop_a.invoiced, dec!(1000));
        assert_eq!(prop_a.collected, dec!(1000));
        assert_eq!(prop_a.outstanding, dec!(0));
    }

    #[tokio::test]
    async fn test_summary_spans_all_domains() {
        let fix = fixture();
        seed_month(&fix).await;

        let report = fix
            .aggregator
            .generate_report(ReportType::Summary, "2024-05", None)
            .await
            .unwrap();

        assert_eq!(report.data.total_invoiced, dec!(1920));
        assert_eq!(report.data.invoice_count, 3);
    }

    #[tokio::test]
    async fn test_scope_excludes_other_months() {
        let fix = fixture();
        seed_month(&fix).await;
        fix.store
            .create_invoice("prop-a", "2024-06", Domain::Rent, dec!(1000))
            .await
            .unwrap();

        let report = fix
            .aggregator
            .generate_report(ReportType::Rent, "2024-05", None)
            .await
            .unwrap();
        assert_eq!(report.data.invoice_count, 2);
    }

    #[tokio::test]
    async fn test_regenerate_is_idempotent_and_upserts() {
        let fix = fixture();
        seed_month(&fix).await;

        let first = fix
            .aggregator
            .generate_report(ReportType::Rent, "2024-05", Some("month close".to_string()))
            .await
            .unwrap();
        let second = fix
            .aggregator
            .generate_report(ReportType::Rent, "2024-05", Some("month close".to_string()))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(
            serde_json::to_vec(&first.data).unwrap(),
            serde_json::to_vec(&second.data).unwrap()
        );
        assert_eq!(
            fix.aggregator
                .list_reports(&ReportFilter::default())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_notes_copied_verbatim() {
        let fix = fixture();
        let report = fix
            .aggregator
            .generate_report(
                ReportType::Meals,
                "2024-05",
                Some("catering supplier changed mid-month".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(
            report.data.notes.as_deref(),
            Some("catering supplier changed mid-month")
        );
    }

    #[tokio::test]
    async fn test_empty_scope_is_zeroed_not_error() {
        let fix = fixture();
        let report = fix
            .aggregator
            .generate_report(ReportType::Utilities, "2024-05", None)
            .await
            .unwrap();
        assert_eq!(report.data.total_invoiced, dec!(0));
        assert_eq!(report.data.invoice_count, 0);
        assert!(report.data.properties.is_empty());
    }

    #[tokio::test]
    async fn test_bad_month_rejected() {
        let fix = fixture();
        let err = fix
            .aggregator
            .generate_report(ReportType::Rent, "05-2024", None)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_missing_report_is_not_found() {
        let fix = fixture();
        let err = fix.aggregator.get_report(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_export_unknown_format_rejected() {
        let fix = fixture();
        let report = fix
            .aggregator
            .generate_report(ReportType::Rent, "2024-05", None)
            .await
            .unwrap();
        let err = fix
            .aggregator
            .export_report(&report.id, "xlsx")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnsupportedFormat { .. }));
    }
}
