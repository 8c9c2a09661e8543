//! HTTP handlers for ledger operations
//!
//! Handlers do the wire-level work only: deserialize, parse enum strings,
//! delegate to the services, and map [`LedgerError`] onto the response. All
//! business rules live behind the service boundary.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{
    Domain, Invoice, LedgerResult, Payment, PaymentMethod, Report, ReportFilter, ReportType,
    ValidationError,
};
use crate::ledger::{LedgerStore, PaymentRecorder};
use crate::reports::ReportAggregator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerStore>,
    pub recorder: Arc<PaymentRecorder>,
    pub reports: Arc<ReportAggregator>,
}

// =============================================================================
// Invoices
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub property_id: String,
    pub month: String,
    pub domain: String,
    pub amount_due: Decimal,
}

/// POST /invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(body): Json<CreateInvoiceRequest>,
) -> LedgerResult<(StatusCode, Json<Invoice>)> {
    let domain = Domain::parse(&body.domain)
        .ok_or_else(|| ValidationError::unknown_value("domain", &body.domain))?;

    let invoice = state
        .ledger
        .create_invoice(&body.property_id, &body.month, domain, body.amount_due)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /invoices/{id}
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> LedgerResult<Json<Invoice>> {
    Ok(Json(state.ledger.get_invoice(&id).await?))
}

/// GET /invoices/{id}/payments
pub async fn list_invoice_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> LedgerResult<Json<Vec<Payment>>> {
    Ok(Json(state.ledger.invoice_payments(&id).await?))
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub invoice_id: Uuid,
    pub amount_paid: Decimal,
    pub method: String,
}

/// POST /payments
pub async fn record_payment(
    State(state): State<AppState>,
    Json(body): Json<RecordPaymentRequest>,
) -> LedgerResult<(StatusCode, Json<Payment>)> {
    let method = PaymentMethod::parse(&body.method)
        .ok_or_else(|| ValidationError::unknown_value("method", &body.method))?;

    let payment = state
        .recorder
        .record_payment(&body.invoice_id, body.amount_paid, method)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub report_type: String,
    pub month: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// POST /finance-reports/generate
pub async fn generate_report(
    State(state): State<AppState>,
    Json(body): Json<GenerateReportRequest>,
) -> LedgerResult<(StatusCode, Json<Report>)> {
    let report_type = ReportType::parse(&body.report_type)
        .ok_or_else(|| ValidationError::unknown_value("report_type", &body.report_type))?;

    let report = state
        .reports
        .generate_report(report_type, &body.month, body.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Deserialize, Default)]
pub struct ReportListQuery {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub month: Option<String>,
}

/// GET /finance-reports?type=&month=
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportListQuery>,
) -> LedgerResult<Json<Vec<Report>>> {
    let report_type = match &query.report_type {
        Some(raw) => Some(
            ReportType::parse(raw).ok_or_else(|| ValidationError::unknown_value("type", raw))?,
        ),
        None => None,
    };

    let filter = ReportFilter {
        report_type,
        month: query.month,
    };
    Ok(Json(state.reports.list_reports(&filter).await?))
}

/// GET /finance-reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> LedgerResult<Json<Report>> {
    Ok(Json(state.reports.get_report(&id).await?))
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// GET /finance-reports/{id}/export?format=
pub async fn export_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> LedgerResult<Response> {
    let format = query
        .format
        .ok_or_else(|| ValidationError::field("format", "is required"))?;

    let exported = state.reports.export_report(&id, &format).await?;
    let headers = [
        (header::CONTENT_TYPE, exported.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", exported.filename),
        ),
    ];
    Ok((headers, exported.bytes).into_response())
}
