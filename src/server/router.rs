//! Router assembly for the ledger routes

use crate::server::handlers::{
    AppState, create_invoice, export_report, generate_report, get_invoice, get_report,
    list_invoice_payments, list_reports, record_payment,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the ledger routes:
/// - POST /invoices - Create an invoice (mints its code)
/// - GET /invoices/{id} - Fetch one invoice
/// - GET /invoices/{id}/payments - Payments posted against an invoice
/// - POST /payments - Record a payment
/// - POST /finance-reports/generate - Aggregate and upsert a report
/// - GET /finance-reports - List reports, newest first
/// - GET /finance-reports/{id} - Fetch one report
/// - GET /finance-reports/{id}/export - Download a report as csv or pdf
pub fn build_routes(state: AppState) -> Router {
    Router::new()
        .route("/invoices", post(create_invoice))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}/payments", get(list_invoice_payments))
        .route("/payments", post(record_payment))
        .route("/finance-reports/generate", post(generate_report))
        .route("/finance-reports", get(list_reports))
        .route("/finance-reports/{id}", get(get_report))
        .route("/finance-reports/{id}/export", get(export_report))
        .with_state(state)
}
