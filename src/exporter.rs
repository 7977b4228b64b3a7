use std::io::Write;

use tracing::info;

use crate::errors::ExportRowError;
use crate::telemetry::DiagnosticsSink;
use crate::types::{discount_for, BookRecord, PriceInfo};

pub const HEADER: [&str; 7] = [
    "title",
    "author",
    "discount_percentage",
    "discount",
    "original_price",
    "price_with_discount",
    "url",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,
    pub skipped: usize,
}

/// Writes `books` as `;`-separated CSV, header first.
///
/// A book that cannot be turned into a row is reported to `sink` and skipped.
/// Only a failure of `out` itself stops the export.
pub fn export_to_csv<W: Write>(
    books: &[BookRecord],
    out: W,
    sink: &dyn DiagnosticsSink,
) -> Result<ExportSummary, csv::Error> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(out);
    writer.write_record(HEADER)?;

    let mut summary = ExportSummary::default();
    for book in books {
        match to_row(book).and_then(|row| writer.write_record(&row).map_err(ExportRowError::from)) {
            Ok(()) => summary.written += 1,
            Err(ExportRowError::Csv(e)) if e.is_io_error() => return Err(e),
            Err(e) => {
                sink.record_skipped(book, &e);
                summary.skipped += 1;
            }
        }
    }

    writer.flush()?;
    info!(
        "{} books exported, {} skipped",
        summary.written, summary.skipped
    );
    Ok(summary)
}

/// Books without a discount get zeroes in every price column.
fn to_row(book: &BookRecord) -> Result<[String; 7], ExportRowError> {
    let (discount_percentage, discount, original, with_discount) = match book.price {
        PriceInfo::NoDiscount => (0.0, 0, 0, 0),
        PriceInfo::Discounted {
            percentage,
            discount,
            original,
            with_discount,
        } => {
            check_price(percentage, discount, original, with_discount)?;
            (
                book.price.discount_percentage(),
                discount,
                original,
                with_discount,
            )
        }
    };

    Ok([
        book.title.clone(),
        book.author.clone(),
        discount_percentage.to_string(),
        discount.to_string(),
        original.to_string(),
        with_discount.to_string(),
        book.url.clone(),
    ])
}

fn check_price(
    percentage: u32,
    discount: u64,
    original: u64,
    with_discount: u64,
) -> Result<(), ExportRowError> {
    if percentage > 100 {
        return Err(ExportRowError::InconsistentPrice(format!(
            "discount of {}%",
            percentage
        )));
    }
    if discount != discount_for(original, percentage) {
        return Err(ExportRowError::InconsistentPrice(format!(
            "{}% of {} is not {}",
            percentage, original, discount
        )));
    }
    if original.checked_sub(discount) != Some(with_discount) {
        return Err(ExportRowError::InconsistentPrice(format!(
            "{} - {} is not {}",
            original, discount, with_discount
        )));
    }
    Ok(())
}
