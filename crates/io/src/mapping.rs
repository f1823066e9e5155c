//! Column-mapping heuristics: match spreadsheet headers to entry fields by
//! keyword, ignoring case, accents and punctuation.

use serde::Serialize;

use crate::error::IoError;
use crate::table::RawTable;

/// Rows scanned when looking for the header row.
pub const HEADER_SCAN_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Code,
    Description,
    Discipline,
    Location,
    Responsible,
    Quantity,
    Unit,
    UnitPrice,
    Total,
    Date,
    Status,
    Origin,
    Regime,
    Reference,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Code => "code",
            Self::Description => "description",
            Self::Discipline => "discipline",
            Self::Location => "location",
            Self::Responsible => "responsible",
            Self::Quantity => "quantity",
            Self::Unit => "unit",
            Self::UnitPrice => "unit_price",
            Self::Total => "total",
            Self::Date => "date",
            Self::Status => "status",
            Self::Origin => "origin",
            Self::Regime => "regime",
            Self::Reference => "reference",
        }
    }
}

/// Which entry shape a sheet holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    Measurement,
    Catalog,
}

impl SheetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Measurement => "measurement",
            Self::Catalog => "catalog",
        }
    }

    /// Fields in matching priority order, each with its header keywords
    /// (already folded). Specific fields come before generic ones so that
    /// "valor unitario" is taken as a price before "valor" can claim it.
    fn keywords(&self) -> &'static [(Field, &'static [&'static str])] {
        match self {
            Self::Measurement => MEASUREMENT_KEYWORDS,
            Self::Catalog => CATALOG_KEYWORDS,
        }
    }
}

const UNIT_PRICE_WORDS: &[&str] = &[
    "valor unitario", "preco unitario", "custo unitario", "vlr unitario", "vlr unit",
    "valor unit", "preco unit", "p unit", "pu", "unit price", "unitario",
];
const UNIT_WORDS: &[&str] = &["unidade", "unid", "und", "un", "unit", "um"];
const CODE_WORDS: &[&str] = &["codigo", "cod", "item", "code", "codigo sinapi", "sinapi"];

static MEASUREMENT_KEYWORDS: &[(Field, &[&str])] = &[
    (Field::UnitPrice, UNIT_PRICE_WORDS),
    (Field::Quantity, &["quantidade", "qtd", "qtde", "quant", "qt", "quantity", "qty"]),
    (Field::Total, &["valor total", "preco total", "vlr total", "custo total", "total", "subtotal", "valor", "amount"]),
    (Field::Unit, UNIT_WORDS),
    (Field::Code, CODE_WORDS),
    (Field::Description, &["descricao", "servico", "discriminacao", "especificacao", "atividade", "description", "nome"]),
    (Field::Discipline, &["disciplina", "categoria", "grupo", "etapa", "discipline", "category"]),
    (Field::Location, &["local", "localizacao", "trecho", "frente", "location"]),
    (Field::Responsible, &["responsavel", "encarregado", "empreiteiro", "fornecedor", "responsible"]),
    (Field::Date, &["data", "data medicao", "date"]),
    (Field::Status, &["status", "situacao"]),
    (Field::Id, &["id"]),
];

static CATALOG_KEYWORDS: &[(Field, &[&str])] = &[
    (Field::UnitPrice, UNIT_PRICE_WORDS),
    (Field::Unit, UNIT_WORDS),
    (Field::Code, CODE_WORDS),
    (Field::Description, &["descricao", "nome", "servico", "insumo", "composicao", "name", "description"]),
    (Field::Origin, &["fonte", "origem", "tabela", "base", "source", "origin"]),
    (Field::Regime, &["regime", "desoneracao", "encargos"]),
    (Field::Reference, &["referencia", "data base", "data", "versao", "mes", "reference", "version"]),
    (Field::UnitPrice, &["preco", "custo", "valor", "price"]),
];

/// Lowercase, strip accents, and collapse everything that is not a letter or
/// digit into single spaces: `"Preço Unit. (R$)"` → `"preco unit r"`.
pub fn fold_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_space = false;
    for c in header.chars().flat_map(char::to_lowercase) {
        let c = match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        };
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchLevel {
    /// Keyword's words appear consecutively inside the header.
    Phrase,
    /// Header equals the keyword.
    Exact,
}

fn match_level(header: &str, keyword: &str) -> Option<MatchLevel> {
    if header == keyword {
        return Some(MatchLevel::Exact);
    }
    let words: Vec<&str> = header.split(' ').collect();
    let kw: Vec<&str> = keyword.split(' ').collect();
    if kw.len() <= words.len() && words.windows(kw.len()).any(|w| w == kw.as_slice()) {
        return Some(MatchLevel::Phrase);
    }
    None
}

fn best_level(header: &str, keywords: &[&str]) -> Option<MatchLevel> {
    keywords.iter().filter_map(|k| match_level(header, k)).max()
}

/// Header index for every field that could be matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMap {
    pub kind: SheetKind,
    /// Row of the table that holds the headers.
    pub header_row: usize,
    /// (field, column index, header text) in column order.
    pub columns: Vec<MappedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedColumn {
    pub field: Field,
    pub index: usize,
    pub header: String,
}

impl ColumnMap {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.iter().find(|c| c.field == field).map(|c| c.index)
    }

    pub fn has(&self, field: Field) -> bool {
        self.index(field).is_some()
    }
}

/// Map one header row. Exact header matches are assigned before phrase
/// matches, each pass in field priority order; a column is used at most
/// once.
pub fn map_headers(headers: &[String], kind: SheetKind, header_row: usize) -> ColumnMap {
    let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();
    let mut taken = vec![false; headers.len()];
    let mut assigned: Vec<MappedColumn> = Vec::new();

    for level in [MatchLevel::Exact, MatchLevel::Phrase] {
        for (field, keywords) in kind.keywords() {
            if assigned.iter().any(|c| c.field == *field) {
                continue;
            }
            let hit = folded.iter().enumerate().find(|(i, h)| {
                !taken[*i] && !h.is_empty() && best_level(h, keywords) == Some(level)
            });
            if let Some((i, _)) = hit {
                taken[i] = true;
                assigned.push(MappedColumn {
                    field: *field,
                    index: i,
                    header: headers[i].trim().to_string(),
                });
            }
        }
    }

    assigned.sort_by_key(|c| c.index);
    ColumnMap {
        kind,
        header_row,
        columns: assigned,
    }
}

fn row_labels(table: &RawTable, row: usize) -> Vec<String> {
    table
        .rows
        .get(row)
        .map(|cells| cells.iter().map(|c| c.as_label()).collect())
        .unwrap_or_default()
}

/// Locate the header row (first of the leading rows with at least two
/// recognised headers; row 0 otherwise), map it, and check required fields.
pub fn detect_columns(table: &RawTable, kind: SheetKind) -> Result<ColumnMap, IoError> {
    if table.is_empty() {
        return Err(IoError::EmptyTable);
    }

    let scan = table.rows.len().min(HEADER_SCAN_ROWS);
    let header_row = (0..scan)
        .find(|&r| map_headers(&row_labels(table, r), kind, r).columns.len() >= 2)
        .unwrap_or(0);

    let map = map_headers(&row_labels(table, header_row), kind, header_row);
    log::debug!(
        "{} header row {}: {}",
        kind.as_str(),
        header_row,
        map.columns
            .iter()
            .map(|c| format!("{}={}", c.field.as_str(), c.header))
            .collect::<Vec<_>>()
            .join(", ")
    );

    match kind {
        SheetKind::Measurement => {
            if !map.has(Field::Quantity) {
                return Err(IoError::MissingColumn { kind: kind.as_str(), column: "quantity" });
            }
            if !map.has(Field::Description) && !map.has(Field::Code) {
                return Err(IoError::MissingColumn { kind: kind.as_str(), column: "description" });
            }
        }
        SheetKind::Catalog => {
            if !map.has(Field::Code) {
                return Err(IoError::MissingColumn { kind: kind.as_str(), column: "code" });
            }
            if !map.has(Field::UnitPrice) {
                return Err(IoError::MissingColumn { kind: kind.as_str(), column: "unit_price" });
            }
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn field_at(map: &ColumnMap, field: Field) -> Option<usize> {
        map.index(field)
    }

    #[test]
    fn fold_strips_accents_and_punctuation() {
        assert_eq!(fold_header("Preço Unit. (R$)"), "preco unit r");
        assert_eq!(fold_header("  DESCRIÇÃO DO SERVIÇO "), "descricao do servico");
        assert_eq!(fold_header("Qtd."), "qtd");
        assert_eq!(fold_header("Localização"), "localizacao");
    }

    #[test]
    fn maps_typical_measurement_sheet() {
        let h = headers(&[
            "Item", "Descrição", "Und", "Quantidade", "Valor Unitário (R$)", "Valor Total (R$)",
            "Disciplina", "Local", "Responsável", "Data",
        ]);
        let map = map_headers(&h, SheetKind::Measurement, 0);
        assert_eq!(field_at(&map, Field::Code), Some(0));
        assert_eq!(field_at(&map, Field::Description), Some(1));
        assert_eq!(field_at(&map, Field::Unit), Some(2));
        assert_eq!(field_at(&map, Field::Quantity), Some(3));
        assert_eq!(field_at(&map, Field::UnitPrice), Some(4));
        assert_eq!(field_at(&map, Field::Total), Some(5));
        assert_eq!(field_at(&map, Field::Discipline), Some(6));
        assert_eq!(field_at(&map, Field::Location), Some(7));
        assert_eq!(field_at(&map, Field::Responsible), Some(8));
        assert_eq!(field_at(&map, Field::Date), Some(9));
    }

    #[test]
    fn english_headers() {
        let h = headers(&["code", "description", "unit", "qty", "unit price", "amount"]);
        let map = map_headers(&h, SheetKind::Measurement, 0);
        assert_eq!(field_at(&map, Field::Quantity), Some(3));
        assert_eq!(field_at(&map, Field::UnitPrice), Some(4));
        assert_eq!(field_at(&map, Field::Total), Some(5));
        assert_eq!(field_at(&map, Field::Unit), Some(2));
    }

    #[test]
    fn exact_total_beats_phrase_total() {
        let h = headers(&["Descrição", "Qtd", "Subtotal parcial", "Total"]);
        let map = map_headers(&h, SheetKind::Measurement, 0);
        assert_eq!(field_at(&map, Field::Total), Some(3));
    }

    #[test]
    fn catalog_price_falls_back_to_generic_word() {
        let h = headers(&["Código", "Descrição", "Unidade", "Preço", "Fonte", "Data Base"]);
        let map = map_headers(&h, SheetKind::Catalog, 0);
        assert_eq!(field_at(&map, Field::Code), Some(0));
        assert_eq!(field_at(&map, Field::Description), Some(1));
        assert_eq!(field_at(&map, Field::Unit), Some(2));
        assert_eq!(field_at(&map, Field::UnitPrice), Some(3));
        assert_eq!(field_at(&map, Field::Origin), Some(4));
        assert_eq!(field_at(&map, Field::Reference), Some(5));
    }

    #[test]
    fn header_row_found_below_title_rows() {
        let table = RawTable::new(vec![
            vec![Cell::text("Boletim de Medição nº 3")],
            vec![Cell::text("Obra: Ponte Rio Claro")],
            vec![
                Cell::text("Item"),
                Cell::text("Descrição"),
                Cell::text("Qtd"),
                Cell::text("P. Unit"),
            ],
            vec![
                Cell::text("1.1"),
                Cell::text("Escavação"),
                Cell::Number(10.0),
                Cell::Number(5.0),
            ],
        ]);
        let map = detect_columns(&table, SheetKind::Measurement).unwrap();
        assert_eq!(map.header_row, 2);
        assert_eq!(map.index(Field::UnitPrice), Some(3));
    }

    #[test]
    fn missing_quantity_is_an_error() {
        let table = RawTable::new(vec![vec![Cell::text("Descrição"), Cell::text("Total")]]);
        let err = detect_columns(&table, SheetKind::Measurement).unwrap_err();
        assert!(err.to_string().contains("quantity"));
    }

    #[test]
    fn catalog_requires_code() {
        let table = RawTable::new(vec![vec![Cell::text("Descrição"), Cell::text("Preço")]]);
        let err = detect_columns(&table, SheetKind::Catalog).unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column: "code", .. }));
    }

    #[test]
    fn empty_table_is_an_error() {
        let err = detect_columns(&RawTable::default(), SheetKind::Catalog).unwrap_err();
        assert!(matches!(err, IoError::EmptyTable));
    }
}
