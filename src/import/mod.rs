//! Loading delimited text into a workbook.

pub mod csv;

pub use self::csv::{CsvLoadOptions, load_csv, read_csv, read_csv_path};
