//! Report serialization to downloadable formats

use crate::core::{LedgerError, LedgerResult, Report};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(ExportFormat::Csv),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// A rendered report ready to be served as a download.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Render a report in the given format.
pub fn render(report: &Report, format: ExportFormat) -> LedgerResult<ExportedReport> {
    let bytes = match format {
        ExportFormat::Csv => render_csv(report)?,
        ExportFormat::Pdf => render_pdf(report),
    };
    Ok(ExportedReport {
        filename: format!(
            "{}-{}.{}",
            report.report_type,
            report.month,
            format.extension()
        ),
        content_type: format.content_type(),
        bytes,
    })
}

fn render_csv(report: &Report) -> LedgerResult<Vec<u8>> {
    let data = &report.data;
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);

    let result: Result<(), csv::Error> = (|| {
        writer.write_record(["report_type", data.report_type.as_str()])?;
        writer.write_record(["month", &data.month])?;
        writer.write_record(["generated_at", &report.generated_at.to_rfc3339()])?;
        writer.write_record(["total_invoiced", &data.total_invoiced.to_string()])?;
        writer.write_record(["total_collected", &data.total_collected.to_string()])?;
        writer.write_record(["outstanding", &data.outstanding.to_string()])?;
        writer.write_record(["invoice_count", &data.invoice_count.to_string()])?;
        writer.write_record(["payment_count", &data.payment_count.to_string()])?;
        if let Some(notes) = &data.notes {
            writer.write_record(["notes", notes])?;
        }

        writer.write_record(["property_id", "invoiced", "collected", "outstanding"])?;
        for property in &data.properties {
            writer.write_record([
                property.property_id.as_str(),
                &property.invoiced.to_string(),
                &property.collected.to_string(),
                &property.outstanding.to_string(),
            ])?;
        }
        Ok(())
    })();
    result.map_err(|e| LedgerError::Internal(format!("csv rendering failed: {}", e)))?;

    writer
        .into_inner()
        .map_err(|e| LedgerError::Internal(format!("csv rendering failed: {}", e)))
}

/// Render a single-page PDF with the report summary and the per-property
/// breakdown as text lines. The document is assembled by hand; the report
/// surface is small enough that a layout engine would be dead weight.
fn render_pdf(report: &Report) -> Vec<u8> {
    let data = &report.data;
    let mut lines = vec![
        format!("{} report - {}", data.report_type, data.month),
        format!("Generated {}", report.generated_at.to_rfc3339()),
        String::new(),
        format!("Total invoiced:  {}", data.total_invoiced),
        format!("Total collected: {}", data.total_collected),
        format!("Outstanding:     {}", data.outstanding),
        format!(
            "{} invoices, {} payments",
            data.invoice_count, data.payment_count
        ),
    ];
    if let Some(notes) = &data.notes {
        lines.push(String::new());
        lines.push(format!("Notes: {}", notes));
    }
    if !data.properties.is_empty() {
        lines.push(String::new());
        lines.push("Per property (invoiced / collected / outstanding):".to_string());
        for property in &data.properties {
            lines.push(format!(
                "  {}: {} / {} / {}",
                property.property_id, property.invoiced, property.collected, property.outstanding
            ));
        }
    }
    build_pdf(&lines)
}

fn build_pdf(lines: &[String]) -> Vec<u8> {
    let mut content = String::from("BT\n/F1 11 Tf\n14 TL\n72 760 Td\n");
    for line in lines {
        content.push_str(&format!("({}) Tj\nT*\n", escape_pdf_text(line)));
    }
    content.push_str("ET\n");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, object).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}

fn escape_pdf_text(text: &str) -> String {
    text.replace('\\', r"\\")
        .replace('(', r"\(")
        .replace(')', r"\)")
}
