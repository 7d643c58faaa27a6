use crate::core::ExtractError;
use crate::http::RawContent;
use crate::models::Record;

/// Records pulled out of one document, plus how many candidate records had
/// to be dropped because they were malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub skipped: usize,
}

impl Extraction {
    pub fn new(records: Vec<Record>, skipped: usize) -> Self {
        Self { records, skipped }
    }
}

/// Turns fetched content into records. New sites are supported by adding an
/// implementation, not by changing the pipeline.
///
/// Zero records is a valid answer. `Err` means the content was not the shape
/// the extractor understands.
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, content: &RawContent) -> Result<Extraction, ExtractError>;
}
