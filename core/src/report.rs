//! File reports of a finished audit.

use std::path::PathBuf;

use thiserror::Error;

pub mod csv;
pub mod xlsx;

pub use self::csv::{save_csv, write_csv};
pub use self::xlsx::save_xlsx;

pub const CSV_HEADER: [&str; 5] = ["Switch IP", "Interface", "MAC address", "IP address", "User"];
pub const SHEET_HEADER: [&str; 4] = ["Interface", "MAC address", "IP address", "User"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("csv: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
