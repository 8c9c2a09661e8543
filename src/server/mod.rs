//! HTTP exposure for the ledger core
//!
//! This module wires the services onto axum routes:
//! - `POST /invoices`, `GET /invoices/{id}`, `GET /invoices/{id}/payments`
//! - `POST /payments`
//! - `POST /finance-reports/generate`, `GET /finance-reports`,
//!   `GET /finance-reports/{id}`, `GET /finance-reports/{id}/export`
//!
//! Request bodies carry enum values as strings; handlers parse them and
//! reject unknown values before any service call.

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::AppState;
pub use router::build_routes;
