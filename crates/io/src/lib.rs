// Spreadsheet ingestion: CSV/TSV and workbooks into measurement and catalog entries

pub mod coerce;
pub mod csv;
pub mod error;
pub mod import;
pub mod mapping;
pub mod table;
pub mod xlsx;

pub use error::IoError;
pub use import::{
    import_catalog, import_measurements, read_table, CatalogImport, ImportOptions,
    MeasurementImport,
};
pub use mapping::{ColumnMap, Field, SheetKind};
