//! Numeric CSV datasets: feature columns followed by one label column.

use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")] Io(#[from] std::io::Error),
    #[error("line {line}, column {column}: cannot parse {value:?} as a number")] Parse { line: usize, column: usize, value: String },
    #[error("line {line}: expected {expected} columns, found {found}")] Ragged { line: usize, expected: usize, found: usize },
    #[error("need at least one feature column and a label column, found {0} columns")] TooFewColumns(usize),
    #[error("dataset has no rows")] Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    rows: Vec<Vec<f64>>,
    labels: Vec<f64>,
    header: Option<Vec<String>>,
}

fn split(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c == ';' || c.is_whitespace()).filter(|s| !s.is_empty()).collect()
}

impl Dataset {
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> { Self::parse(&fs::read_to_string(path)?) }

    /// Blank lines and `#` comments are skipped; a first line that is not
    /// numeric is taken as the header.
    pub fn parse(text: &str) -> Result<Self, DatasetError> {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut header = None;
        let mut width: Option<usize> = None;
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') { continue; }
            let cells = split(trimmed);
            let parsed: Result<Vec<f64>, usize> = cells.iter().enumerate().map(|(c, v)| v.parse::<f64>().map_err(|_| c)).collect();
            let values = match parsed {
                Ok(v) => v,
                Err(_) if width.is_none() && header.is_none() => {
                    header = Some(cells.iter().map(|s| s.to_string()).collect());
                    width = Some(cells.len());
                    continue;
                }
                Err(c) => return Err(DatasetError::Parse { line, column: c + 1, value: cells[c].to_string() }),
            };
            let expected = *width.get_or_insert(values.len());
            if values.len() != expected { return Err(DatasetError::Ragged { line, expected, found: values.len() }); }
            if expected < 2 { return Err(DatasetError::TooFewColumns(expected)); }
            let (feats, label) = values.split_at(expected - 1);
            rows.push(feats.to_vec());
            labels.push(label[0]);
        }
        if rows.is_empty() { return Err(DatasetError::Empty); }
        Ok(Self { rows, labels, header })
    }

    /// Number of feature columns (label excluded).
    pub fn dim(&self) -> usize { self.rows.first().map(|r| r.len()).unwrap_or(0) }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn rows(&self) -> &[Vec<f64>] { &self.rows }
    pub fn labels(&self) -> &[f64] { &self.labels }
    pub fn feature_names(&self) -> Option<&[String]> { self.header.as_ref().map(|h| &h[..h.len().saturating_sub(1)]) }

    /// Min-max scale every feature column into `[0, 1]`; constant columns become 0.
    pub fn normalized(&self) -> Self {
        let dim = self.dim();
        let mut lo = vec![f64::INFINITY; dim];
        let mut hi = vec![f64::NEG_INFINITY; dim];
        for r in &self.rows {
            for d in 0..dim { lo[d] = lo[d].min(r[d]); hi[d] = hi[d].max(r[d]); }
        }
        let rows = self.rows.iter().map(|r| {
            (0..dim).map(|d| { let span = hi[d] - lo[d]; if span > 0.0 { (r[d] - lo[d]) / span } else { 0.0 } }).collect()
        }).collect();
        Self { rows, labels: self.labels.clone(), header: self.header.clone() }
    }
}
