mod json_parser;

pub use json_parser::JsonProductExtractor;
