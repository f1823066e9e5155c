//! File → typed entries: read the table, map its columns, coerce each row.

use std::path::Path;

use serde::Serialize;

use medir_core::config::DEFAULT_OUTLIER_SIGMA;
use medir_core::outlier::{quantity_stats, tag_outliers, QuantityStats};
use medir_core::{CatalogEntry, EntryStatus, MeasurementEntry};

use crate::coerce::{cell_iso_date, cell_number};
use crate::error::IoError;
use crate::mapping::{detect_columns, fold_header, ColumnMap, Field, SheetKind};
use crate::table::{Cell, RawTable};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Worksheet name for workbooks; ignored for CSV.
    pub sheet: Option<String>,
    /// Field delimiter for CSV; sniffed when `None`.
    pub delimiter: Option<u8>,
    /// Outlier threshold in standard deviations.
    pub outlier_sigma: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            delimiter: None,
            outlier_sigma: DEFAULT_OUTLIER_SIGMA,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasurementImport {
    pub entries: Vec<MeasurementEntry>,
    pub mapping: ColumnMap,
    /// Non-blank data rows that were not imported (totals, empty items).
    pub skipped_rows: usize,
    /// Entries tagged as outliers at import.
    pub outliers: usize,
    pub stats: QuantityStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogImport {
    pub entries: Vec<CatalogEntry>,
    pub mapping: ColumnMap,
    pub skipped_rows: usize,
}

/// Read a CSV/TSV or workbook file into a raw table, by extension.
pub fn read_table(path: &Path, options: &ImportOptions) -> Result<RawTable, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => crate::csv::read_csv(path, options.delimiter),
        "tsv" | "tab" => crate::csv::read_csv(path, Some(options.delimiter.unwrap_or(b'\t'))),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => {
            crate::xlsx::read_workbook(path, options.sheet.as_deref())
        }
        other => Err(IoError::UnsupportedFormat(other.to_string())),
    }
}

/// Row accessor bound to a column map.
struct Row<'a> {
    table: &'a RawTable,
    map: &'a ColumnMap,
    index: usize,
}

impl<'a> Row<'a> {
    fn cell(&self, field: Field) -> Option<&'a Cell> {
        self.map.index(field).map(|c| self.table.get(self.index, c))
    }

    fn label(&self, field: Field) -> String {
        self.cell(field).map(Cell::as_label).unwrap_or_default()
    }

    fn number(&self, field: Field) -> Option<f64> {
        self.cell(field).and_then(cell_number)
    }

    fn is_blank(&self) -> bool {
        self.table
            .rows
            .get(self.index)
            .map_or(true, |cells| cells.iter().all(Cell::is_empty))
    }

    /// Subtotal/total lines carry the word in their code or description.
    fn is_total_line(&self) -> bool {
        [Field::Description, Field::Code].iter().any(|f| {
            let folded = fold_header(&self.label(*f));
            folded.starts_with("total")
                || folded.starts_with("subtotal")
                || folded.starts_with("sub total")
        })
    }
}

fn data_rows<'a>(table: &'a RawTable, map: &'a ColumnMap) -> impl Iterator<Item = Row<'a>> {
    (map.header_row + 1..table.rows.len()).map(move |index| Row { table, map, index })
}

fn parse_status(label: &str) -> EntryStatus {
    match fold_header(label).as_str() {
        "pendente" | "pending" | "em analise" => EntryStatus::Pending,
        "outlier" | "atipico" => EntryStatus::Outlier,
        _ => EntryStatus::Normal,
    }
}

/// Import a measurement sheet and tag quantity outliers.
pub fn import_measurements(path: &Path, options: &ImportOptions) -> Result<MeasurementImport, IoError> {
    let table = read_table(path, options)?;
    let import = measurements_from_table(&table, options.outlier_sigma)?;
    log::info!(
        "{}: {} entries imported, {} rows skipped, {} outliers",
        path.display(),
        import.entries.len(),
        import.skipped_rows,
        import.outliers
    );
    Ok(import)
}

pub fn measurements_from_table(table: &RawTable, outlier_sigma: f64) -> Result<MeasurementImport, IoError> {
    let map = detect_columns(table, SheetKind::Measurement)?;
    let has_total = map.has(Field::Total);
    let mut entries = Vec::new();
    let mut skipped_rows = 0;

    for row in data_rows(table, &map) {
        if row.is_blank() {
            continue;
        }
        let description = row.label(Field::Description);
        let code = row.label(Field::Code);
        let quantity = row.number(Field::Quantity).unwrap_or(0.0);

        if row.is_total_line() || (description.is_empty() && code.is_empty() && quantity == 0.0) {
            log::debug!("skipping row {}", row.index + 1);
            skipped_rows += 1;
            continue;
        }

        let unit_price = row.number(Field::UnitPrice).unwrap_or(0.0);
        // Without a total column the sheet's own total is the product.
        let stated_total = if has_total {
            row.number(Field::Total).unwrap_or(0.0)
        } else {
            quantity * unit_price
        };
        let id = match row.label(Field::Id) {
            id if id.is_empty() => format!("row-{}", row.index + 1),
            id => id,
        };

        entries.push(MeasurementEntry {
            id,
            code: Some(code).filter(|c| !c.is_empty()),
            description,
            discipline: row.label(Field::Discipline),
            location: row.label(Field::Location),
            responsible: row.label(Field::Responsible),
            quantity,
            unit: row.label(Field::Unit),
            unit_price,
            stated_total,
            date: row.cell(Field::Date).map(cell_iso_date).unwrap_or_default(),
            status: parse_status(&row.label(Field::Status)),
        });
    }

    let stats = quantity_stats(&entries, outlier_sigma);
    let outliers = tag_outliers(&mut entries, outlier_sigma);

    Ok(MeasurementImport {
        entries,
        mapping: map,
        skipped_rows,
        outliers,
        stats,
    })
}

/// Import a unit-price catalog (TPU) sheet.
pub fn import_catalog(path: &Path, options: &ImportOptions) -> Result<CatalogImport, IoError> {
    let table = read_table(path, options)?;
    let import = catalog_from_table(&table)?;
    log::info!(
        "{}: {} catalog items imported, {} rows skipped",
        path.display(),
        import.entries.len(),
        import.skipped_rows
    );
    Ok(import)
}

pub fn catalog_from_table(table: &RawTable) -> Result<CatalogImport, IoError> {
    let map = detect_columns(table, SheetKind::Catalog)?;
    let mut entries = Vec::new();
    let mut skipped_rows = 0;

    for row in data_rows(table, &map) {
        if row.is_blank() {
            continue;
        }
        let code = row.label(Field::Code);
        if code.is_empty() || row.is_total_line() {
            skipped_rows += 1;
            continue;
        }
        entries.push(CatalogEntry {
            code,
            name: row.label(Field::Description),
            unit: row.label(Field::Unit),
            unit_price: row.number(Field::UnitPrice).unwrap_or(0.0),
            origin: row.label(Field::Origin),
            regime: row.label(Field::Regime),
            reference: row.label(Field::Reference),
        });
    }

    Ok(CatalogImport {
        entries,
        mapping: map,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const MEDICAO: &str = "\
Boletim de Medição 03/2025;;;;;;
Item;Descrição;Und;Qtd;Preço Unit.;Total;Disciplina;Data;Status
1.1;Escavação;m3;10;R$ 20,00;R$ 200,00;Terraplenagem;01/03/2025;
1.2;Aterro;m3;5;8,00;45,00;Terraplenagem;02/03/2025;pendente
;;;;;;;;
;Subtotal Terraplenagem;;;;245,00;;;
2.1;Concreto;m3;2,5;500,00;1.250,00;Estrutura;45717;
";

    #[test]
    fn imports_measurement_csv() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "medicao.csv", MEDICAO);

        let import = import_measurements(&path, &ImportOptions::default()).unwrap();
        assert_eq!(import.mapping.header_row, 1);
        assert_eq!(import.entries.len(), 3);
        assert_eq!(import.skipped_rows, 1);
        assert_eq!(import.outliers, 0);

        let e = &import.entries[0];
        assert_eq!(e.id, "row-3");
        assert_eq!(e.code.as_deref(), Some("1.1"));
        assert_eq!(e.description, "Escavação");
        assert_eq!(e.unit, "m3");
        assert_eq!(e.quantity, 10.0);
        assert_eq!(e.unit_price, 20.0);
        assert_eq!(e.stated_total, 200.0);
        assert_eq!(e.discipline, "Terraplenagem");
        assert_eq!(e.date, "2025-03-01");

        assert_eq!(import.entries[1].status, EntryStatus::Pending);
        assert_eq!(import.entries[2].quantity, 2.5);
        assert_eq!(import.entries[2].stated_total, 1250.0);
        assert_eq!(import.entries[2].date, "2025-03-01");
    }

    #[test]
    fn missing_total_column_uses_product() {
        let table = RawTable::new(vec![
            vec![Cell::text("Descrição"), Cell::text("Qtd"), Cell::text("P. Unit")],
            vec![Cell::text("Forma"), Cell::Number(4.0), Cell::Number(2.5)],
        ]);
        let import = measurements_from_table(&table, DEFAULT_OUTLIER_SIGMA).unwrap();
        assert_eq!(import.entries[0].stated_total, 10.0);
    }

    #[test]
    fn id_column_is_used_when_present() {
        let table = RawTable::new(vec![
            vec![Cell::text("ID"), Cell::text("Descrição"), Cell::text("Quantidade")],
            vec![Cell::text("M-001"), Cell::text("Forma"), Cell::Number(4.0)],
        ]);
        let import = measurements_from_table(&table, DEFAULT_OUTLIER_SIGMA).unwrap();
        assert_eq!(import.entries[0].id, "M-001");
    }

    #[test]
    fn outliers_tagged_at_import() {
        let mut rows = vec![vec![Cell::text("Descrição"), Cell::text("Qtd")]];
        for i in 0..20 {
            rows.push(vec![Cell::Text(format!("item {i}")), Cell::Number(10.0)]);
        }
        rows.push(vec![Cell::text("item grande"), Cell::Number(1000.0)]);
        let import = measurements_from_table(&RawTable::new(rows), 3.0).unwrap();
        assert_eq!(import.outliers, 1);
        assert_eq!(import.entries[20].status, EntryStatus::Outlier);
        assert_eq!(import.stats.count, 21);
    }

    #[test]
    fn imports_catalog_csv() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "tpu.csv",
            "Código;Descrição;Unidade;Preço;Fonte;Data Base\n\
             87878;Chapisco;m2;3,50;SINAPI;2025-01\n\
             ;linha sem código;;;;\n\
             87879;Emboço;m2;1.234,56;SINAPI;2025-01\n",
        );
        let import = import_catalog(&path, &ImportOptions::default()).unwrap();
        assert_eq!(import.entries.len(), 2);
        assert_eq!(import.skipped_rows, 1);
        assert_eq!(import.entries[0].code, "87878");
        assert_eq!(import.entries[0].name, "Chapisco");
        assert_eq!(import.entries[0].origin, "SINAPI");
        assert_eq!(import.entries[1].unit_price, 1234.56);
        assert_eq!(import.entries[1].reference, "2025-01");
    }

    #[test]
    fn csv_with_bare_title_line_is_importable() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "boletim.csv",
            "Boletim de Medicao 03\n\
             Item;Descricao;Qtd;P. Unit;Total\n\
             1.1;Escavacao;10,5;20,00;210,00\n\
             1.2;Aterro;3;8,00;24,00\n",
        );
        let import = import_measurements(&path, &ImportOptions::default()).unwrap();
        assert_eq!(import.mapping.header_row, 1);
        assert_eq!(import.entries.len(), 2);
        assert_eq!(import.entries[0].id, "row-3");
        assert_eq!(import.entries[0].quantity, 10.5);
        assert_eq!(import.entries[0].unit_price, 20.0);
        assert_eq!(import.entries[0].stated_total, 210.0);
    }

    #[test]
    fn workbook_row_ids_follow_sheet_rows() {
        use rust_xlsxwriter::Workbook;

        let dir = tempdir().unwrap();
        let path = dir.path().join("medicao.xlsx");
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        for (col, header) in ["Item", "Descrição", "Qtd", "Preço Unit.", "Total"].iter().enumerate() {
            ws.write_string(2, col as u16, *header).unwrap();
        }
        ws.write_string(3, 0, "1.1").unwrap();
        ws.write_string(3, 1, "Escavação").unwrap();
        ws.write_number(3, 2, 10.0).unwrap();
        ws.write_number(3, 3, 20.0).unwrap();
        ws.write_number(3, 4, 200.0).unwrap();
        workbook.save(&path).unwrap();

        let import = import_measurements(&path, &ImportOptions::default()).unwrap();
        assert_eq!(import.mapping.header_row, 2);
        assert_eq!(import.entries.len(), 1);
        assert_eq!(import.entries[0].id, "row-4");
        assert_eq!(import.entries[0].stated_total, 200.0);
    }

    #[test]
    fn unsupported_extension() {
        let err = read_table(Path::new("medicao.pdf"), &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat(ref e) if e == "pdf"));
    }

    #[test]
    fn catalog_without_price_column_fails() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "tpu.csv", "Código,Descrição\n1,a\n");
        let err = import_catalog(&path, &ImportOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column: "unit_price", .. }));
    }
}
