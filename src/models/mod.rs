mod record;
mod result;

pub use record::{Record, RecordError, NOT_AVAILABLE};
pub use result::{ErrorKind, ScrapeError, ScrapeOutcome, ScrapeResult};
