mod content;
mod key;

pub use content::{detect_content_type, ContentType, RawContent};
pub use key::{KeyError, RequestKey};
