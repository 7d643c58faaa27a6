pub mod base;
pub mod html;
pub mod json;

pub use base::{Extraction, FieldExtractor};
pub use html::{HtmlProductExtractor, HtmlSelectors};
pub use json::JsonProductExtractor;
