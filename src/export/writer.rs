use crate::core::ScraperResult;
use crate::models::{ScrapeOutcome, ScrapeResult};
use log::info;
use std::fs::File;
use std::io;
use std::path::Path;

pub const CSV_HEADER: [&str; 5] = ["url", "name", "price", "promo_price", "error"];

/// Writes one row per record. A failed result becomes a single row with
/// empty record columns and the error in the last column; a success without
/// records writes nothing.
pub fn write_results_csv<W: io::Write>(writer: W, results: &[ScrapeResult]) -> ScraperResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for result in results {
        let url = result.target.as_str();
        match &result.outcome {
            ScrapeOutcome::Success { products } => {
                for record in products {
                    wtr.write_record([url, record.name(), record.price(), record.promo_price(), ""])?;
                }
            }
            ScrapeOutcome::Failure { error } => {
                let message = error.to_string();
                wtr.write_record([url, "", "", "", message.as_str()])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_results_csv_file<P: AsRef<Path>>(path: P, results: &[ScrapeResult]) -> ScraperResult<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_results_csv(file, results)?;
    info!("Wrote {} results to {}", results.len(), path.display());
    Ok(())
}
