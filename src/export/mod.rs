mod writer;

pub use writer::{write_results_csv, write_results_csv_file, CSV_HEADER};
