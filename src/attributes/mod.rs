mod processor;

pub use processor::{
    extract_custom_attributes, write_attributes_csv, AttributeProcessor, ProductAttributes,
    DEFAULT_LOCALE,
};
