//! Report types: report scopes and the persisted aggregate snapshot

use crate::core::invoice::Domain;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Scope of a financial report. One persisted report exists per
/// (report type, month) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Rent,
    Utilities,
    Meals,
    Summary,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Rent => "rent",
            ReportType::Utilities => "utilities",
            ReportType::Meals => "meals",
            ReportType::Summary => "summary",
        }
    }

    /// Parse a report type from its wire representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rent" => Some(ReportType::Rent),
            "utilities" => Some(ReportType::Utilities),
            "meals" => Some(ReportType::Meals),
            "summary" => Some(ReportType::Summary),
            _ => None,
        }
    }

    /// The invoice domain this report aggregates, or None for the
    /// all-domain summary.
    pub fn domain(&self) -> Option<Domain> {
        match self {
            ReportType::Rent => Some(Domain::Rent),
            ReportType::Utilities => Some(Domain::Utility),
            ReportType::Meals => Some(Domain::Meal),
            ReportType::Summary => None,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invoiced/collected/outstanding figures for one property within a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTotals {
    pub property_id: String,
    pub invoiced: Decimal,
    pub collected: Decimal,
    pub outstanding: Decimal,
}

/// Aggregate snapshot computed from the ledger for one scope.
///
/// `properties` is sorted by property id so that aggregating an unchanged
/// ledger twice serializes to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub report_type: ReportType,
    pub month: String,
    pub total_invoiced: Decimal,
    pub total_collected: Decimal,
    pub outstanding: Decimal,
    pub invoice_count: usize,
    pub payment_count: usize,
    pub properties: Vec<PropertyTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A persisted report. Regenerating the same scope replaces `data` and
/// `generated_at` but keeps the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub report_type: ReportType,
    pub month: String,
    pub generated_at: DateTime<Utc>,
    pub data: ReportData,
}

impl Report {
    pub fn new(report_type: ReportType, month: String, data: ReportData) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_type,
            month,
            generated_at: Utc::now(),
            data,
        }
    }
}

/// Filter for report listings.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub report_type: Option<ReportType>,
    pub month: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type_parse_roundtrip() {
        for rt in [
            ReportType::Rent,
            ReportType::Utilities,
            ReportType::Meals,
            ReportType::Summary,
        ] {
            assert_eq!(ReportType::parse(rt.as_str()), Some(rt));
        }
        assert_eq!(ReportType::parse("quarterly"), None);
    }

    #[test]
    fn test_report_type_domain_mapping() {
        assert_eq!(ReportType::Rent.domain(), Some(Domain::Rent));
        assert_eq!(ReportType::Utilities.domain(), Some(Domain::Utility));
        assert_eq!(ReportType::Meals.domain(), Some(Domain::Meal));
        assert_eq!(ReportType::Summary.domain(), None);
    }
}
