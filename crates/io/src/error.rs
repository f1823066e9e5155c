use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or read.
    Read { path: String, message: String },
    /// CSV parse error.
    Csv(String),
    /// Excel/ODS workbook error (open, missing sheet, bad range).
    Spreadsheet(String),
    /// File extension not recognised as CSV or a workbook.
    UnsupportedFormat(String),
    /// No rows at all.
    EmptyTable,
    /// A required column could not be matched to any header.
    MissingColumn { kind: &'static str, column: &'static str },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Spreadsheet(msg) => write!(f, "spreadsheet error: {msg}"),
            Self::UnsupportedFormat(ext) => {
                write!(f, "unsupported file format '{ext}' (expected csv, tsv, xlsx, xls, ods)")
            }
            Self::EmptyTable => write!(f, "file contains no rows"),
            Self::MissingColumn { kind, column } => {
                write!(f, "{kind} sheet: no header matches required column '{column}'")
            }
        }
    }
}

impl std::error::Error for IoError {}
