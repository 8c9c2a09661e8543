//! Storage trait and backends for the ledger
//!
//! [`LedgerStorage`] is the single seam between the services and the durable
//! store. It exposes the two atomic primitives the ledger's guarantees rest
//! on: the counter read-increment-write ([`LedgerStorage::allocate_seq`]) and
//! the invoice compare-and-set ([`LedgerStorage::commit_payment`]). A backend
//! must make each trait call atomic with respect to the entity it touches;
//! nothing here requires locking whole collections.

pub mod in_memory;

pub use in_memory::InMemoryLedgerStorage;

use crate::core::{
    Counter, Domain, Invoice, Payment, Report, ReportFilter, StorageError,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Durable store for counters, invoices, payments, and reports.
///
/// Mutation ownership follows the component boundaries: only the sequence
/// allocator calls `allocate_seq`, only the ledger store inserts invoices,
/// only the payment recorder commits payments, and only the report
/// aggregator upserts reports.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    // === Counters ===

    /// Atomically increment the counter for `key`, creating it with the given
    /// prefix and pad if absent. Creation is race-safe: concurrent first
    /// callers observe one counter, never two. Returns the post-increment
    /// state, so `Counter::code()` on the result is the freshly minted code.
    async fn allocate_seq(
        &self,
        key: &str,
        prefix: &str,
        pad: usize,
    ) -> Result<Counter, StorageError>;

    // === Invoices ===

    /// Insert a new invoice, enforcing the unique code index and the
    /// composite (property, month, domain) constraint for single-per-period
    /// domains. Returns `UniqueViolation` with constraint `"invoice_period"`
    /// or `"invoice_code"` on conflict.
    async fn insert_invoice(&self, invoice: Invoice) -> Result<Invoice, StorageError>;

    async fn get_invoice(&self, id: &Uuid) -> Result<Option<Invoice>, StorageError>;

    /// Look up the invoice occupying a (property, month, domain) slot.
    async fn find_invoice_for_period(
        &self,
        property_id: &str,
        month: &str,
        domain: Domain,
    ) -> Result<Option<Invoice>, StorageError>;

    /// All invoices for a month, optionally narrowed to one domain,
    /// ordered by code.
    async fn list_invoices_for_month(
        &self,
        month: &str,
        domain: Option<Domain>,
    ) -> Result<Vec<Invoice>, StorageError>;

    // === Payments ===

    /// Commit one payment: insert the payment row and store the updated
    /// invoice in a single atomic step, iff the stored invoice version still
    /// equals `expected_version`. Returns `VersionConflict` when another
    /// writer got there first (or the invoice is gone); the caller reloads
    /// and retries.
    async fn commit_payment(
        &self,
        invoice: Invoice,
        payment: Payment,
        expected_version: u64,
    ) -> Result<Invoice, StorageError>;

    /// Payments referencing one invoice, most recent payment_date first.
    async fn list_payments_for_invoice(
        &self,
        invoice_id: &Uuid,
    ) -> Result<Vec<Payment>, StorageError>;

    // === Reports ===

    /// Insert or replace the report for its (report_type, month) scope. An
    /// existing report keeps its id; data and generated_at are replaced.
    async fn upsert_report(&self, report: Report) -> Result<Report, StorageError>;

    async fn get_report(&self, id: &Uuid) -> Result<Option<Report>, StorageError>;

    /// Reports matching the filter, most recently generated first.
    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, StorageError>;
}
