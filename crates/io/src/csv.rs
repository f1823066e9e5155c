// CSV/TSV reading into a raw table

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::IoError;
use crate::table::{Cell, RawTable};

/// Read a delimited file. `delimiter` overrides sniffing.
pub fn read_csv(path: &Path, delimiter: Option<u8>) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    log::debug!(
        "reading {} with delimiter {:?}",
        path.display(),
        delimiter as char
    );
    parse_delimited(&content, delimiter)
}

const DELIMITER_CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_LINES: usize = 10;

/// Guess the field delimiter from the first non-blank lines.
///
/// Each candidate is scored on its dominant row width: the multi-field width
/// shared by the most sample lines, times that width. Title lines above the
/// header split into one field under every candidate and simply do not vote.
/// Ties go to the earlier candidate, so `;` beats `,` on sheets with decimal
/// commas. Falls back to `,` when nothing splits.
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = (b',', 0usize);
    for delim in DELIMITER_CANDIDATES {
        let score = dominant_width(&sample, delim)
            .map(|(width, lines)| width * lines)
            .unwrap_or(0);
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

/// Most common field count above one, with the number of lines that have it.
/// Wider rows win a tie in line count.
fn dominant_width(lines: &[&str], delimiter: u8) -> Option<(usize, usize)> {
    let mut widths: BTreeMap<usize, usize> = BTreeMap::new();
    for line in lines {
        let width = field_count(line, delimiter);
        if width > 1 {
            *widths.entry(width).or_default() += 1;
        }
    }
    widths
        .into_iter()
        .max_by_key(|&(width, lines)| (lines, width))
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map_or(1, |r| r.len())
}

/// Read file and convert to UTF-8 if needed (Windows-1252 is the usual
/// encoding of spreadsheet exports on Brazilian desktops).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |e: std::io::Error| IoError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Every field becomes a text cell; coercion happens at import time.
pub fn parse_delimited(content: &str, delimiter: u8) -> Result<RawTable, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::Csv(e.to_string()))?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok(RawTable::new(rows))
}
