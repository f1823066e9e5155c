// Excel/ODS reading into a raw table (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::coerce::excel_serial_to_date;
use crate::error::IoError;
use crate::table::{Cell, RawTable};

/// Read one worksheet: the named one, or the first in the workbook.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<RawTable, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| IoError::Spreadsheet(format!("failed to open {}: {}", path.display(), e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted || n.trim().eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| {
                IoError::Spreadsheet(format!(
                    "no sheet named '{}' (available: {})",
                    wanted,
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IoError::Spreadsheet("workbook contains no sheets".into()))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| IoError::Spreadsheet(format!("failed to read sheet '{}': {}", name, e)))?;

    let (height, width) = range.get_size();
    log::debug!("sheet '{}' of {}: {}x{}", name, path.display(), height, width);

    // The used range may start below row 1 or right of column A; pad both so
    // table indices stay sheet indices.
    let (data_start_row, data_start_col) = range.start().unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); data_start_row as usize];
    rows.extend(range.rows().map(|row| {
        let mut cells = vec![Cell::Empty; data_start_col as usize];
        cells.extend(row.iter().map(convert_cell));
        cells
    }));

    Ok(RawTable::new(rows))
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.into()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => {
            // 1900 date system assumed; 1904 workbooks are rare in practice
            let serial = dt.as_f64();
            match excel_serial_to_date(serial) {
                Some(d) => Cell::Date(d),
                None => Cell::Number(serial),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::{Format, Workbook};
    use tempfile::tempdir;

    #[test]
    fn reads_first_sheet_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("medicao.xlsx");

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.write_string(0, 0, "Descrição").unwrap();
        ws.write_string(0, 1, "Qtd").unwrap();
        ws.write_string(1, 0, "Escavação").unwrap();
        ws.write_number(1, 1, 12.5).unwrap();
        workbook.save(&path).unwrap();

        let table = read_workbook(&path, None).unwrap();
        assert_eq!(table.get(0, 0), &Cell::Text("Descrição".into()));
        assert_eq!(table.get(1, 1), &Cell::Number(12.5));
    }

    #[test]
    fn leading_blank_rows_and_columns_keep_sheet_positions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.write_string(2, 1, "Qtd").unwrap();
        ws.write_number(3, 1, 7.0).unwrap();
        workbook.save(&path).unwrap();

        let table = read_workbook(&path, None).unwrap();
        assert_eq!(table.rows.len(), 4);
        assert!(table.get(0, 0).is_empty());
        assert_eq!(table.get(2, 1), &Cell::Text("Qtd".into()));
        assert_eq!(table.get(3, 1), &Cell::Number(7.0));
    }

    #[test]
    fn selects_sheet_by_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut workbook = Workbook::new();
        let first = workbook.add_worksheet();
        first.set_name("Resumo").unwrap();
        first.write_string(0, 0, "capa").unwrap();
        let second = workbook.add_worksheet();
        second.set_name("Medição").unwrap();
        second.write_string(0, 0, "Código").unwrap();
        workbook.save(&path).unwrap();

        let table = read_workbook(&path, Some("Medição")).unwrap();
        assert_eq!(table.get(0, 0), &Cell::Text("Código".into()));

        let err = read_workbook(&path, Some("Planilha9")).unwrap_err();
        assert!(err.to_string().contains("Resumo, Medição"));
    }

    #[test]
    fn date_cells_become_dates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");

        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        ws.write_string(0, 0, "Data").unwrap();
        ws.write_number_with_format(1, 0, 45717.0, &date_format).unwrap();
        workbook.save(&path).unwrap();

        let table = read_workbook(&path, None).unwrap();
        assert_eq!(
            table.get(1, 0),
            &Cell::Date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
        );
    }

    #[test]
    fn unreadable_workbook_is_spreadsheet_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(
            read_workbook(&path, None),
            Err(IoError::Spreadsheet(_))
        ));
    }
}
