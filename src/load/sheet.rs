//! Tabular access to workbook sheets
//!
//! The loader only ever sees `Sheet`s: a header row followed by rows of
//! `Cell`s. `Excel` produces them from a file through `calamine`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use tracing::debug;

use crate::lib::date::{parse_date, Date};
use crate::load::error::LoadError;

/// Value of a single cell, reduced to what the loader cares about
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(Date),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.trim().to_string()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(dt) => Cell::Date(dt.date()),
                None => Cell::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => match parse_date(s) {
                Some(date) => Cell::Date(date),
                None => Cell::Text(s.clone()),
            },
            Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Date(d) => write!(f, "{}", d),
        }
    }
}

static EMPTY: Cell = Cell::Empty;

/// A named table whose first row holds the column headers
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new<S>(name: S, header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self
    where
        S: ToString,
    {
        Self {
            name: name.to_string(),
            header,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the column with this exact header
    pub fn column(&self, name: &str) -> Result<usize, LoadError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                sheet: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Data rows with their spreadsheet row number (the header is row 1)
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[Cell])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i + 2, row.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Cell of a row, rows shorter than the header are padded with empty cells
pub fn cell(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

/// Source of sheets
pub trait Workbook {
    fn sheet(&mut self, name: &str) -> Result<Sheet, LoadError>;
}

/// Workbook file read through `calamine` (xlsx, xlsm, xls, ods)
pub struct Excel {
    path: PathBuf,
    inner: Sheets<BufReader<File>>,
}

impl Excel {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let inner = open_workbook_auto(path).map_err(|e| LoadError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("opened workbook {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }
}

impl Workbook for Excel {
    fn sheet(&mut self, name: &str) -> Result<Sheet, LoadError> {
        if !self.inner.sheet_names().iter().any(|s| s == name) {
            return Err(LoadError::MissingSheet {
                sheet: name.to_string(),
            });
        }
        let range = self.inner.worksheet_range(name).map_err(|e| LoadError::Open {
            path: self.path.clone(),
            reason: format!("sheet '{}': {}", name, e),
        })?;
        let mut rows = range.rows();
        let header = rows
            .next()
            .map(|r| r.iter().map(|c| Cell::from(c).to_string()).collect())
            .unwrap_or_default();
        let rows = rows
            .map(|r| r.iter().map(Cell::from).collect())
            .collect::<Vec<_>>();
        debug!("sheet '{}': {} data rows", name, rows.len());
        Ok(Sheet::new(name, header, rows))
    }
}

/// Workbook held in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Memory {
    sheets: Vec<Sheet>,
    /// number of `sheet` calls answered
    pub reads: usize,
}

#[cfg(test)]
impl Memory {
    pub fn with(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }
}

#[cfg(test)]
impl Workbook for Memory {
    fn sheet(&mut self, name: &str) -> Result<Sheet, LoadError> {
        self.reads += 1;
        self.sheets
            .iter()
            .find(|s| s.name() == name)
            .cloned()
            .ok_or_else(|| LoadError::MissingSheet {
                sheet: name.to_string(),
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn calamine_cells() {
        assert_eq!(Cell::from(&Data::Empty), Cell::Empty);
        assert_eq!(Cell::from(&Data::String("  ".to_string())), Cell::Empty);
        assert_eq!(
            Cell::from(&Data::String(" Varejo ".to_string())),
            Cell::Text("Varejo".to_string())
        );
        assert_eq!(Cell::from(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(Cell::from(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(
            Cell::from(&Data::DateTimeIso("2024-01-05T00:00:00".to_string())),
            Cell::Date(Date::from_ymd_opt(2024, 1, 5).unwrap())
        );
    }

    #[test]
    fn columns_by_header() {
        let sheet = Sheet::new(
            "CALENDARIO",
            vec!["DATA".to_string(), "FATURAMENTO".to_string()],
            vec![vec![Cell::Number(1.0)], vec![]],
        );
        assert_eq!(sheet.column("FATURAMENTO"), Ok(1));
        assert_eq!(
            sheet.column("GLOSAS"),
            Err(LoadError::MissingColumn {
                sheet: "CALENDARIO".to_string(),
                column: "GLOSAS".to_string(),
            })
        );
        let rows = sheet.rows().collect::<Vec<_>>();
        assert_eq!(rows[0].0, 2);
        assert_eq!(cell(rows[0].1, 1), &Cell::Empty);
        assert_eq!(cell(rows[1].1, 0), &Cell::Empty);
    }

    #[test]
    fn reads_a_written_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut book = rust_xlsxwriter::Workbook::new();
        {
            let sheet = book.add_worksheet().set_name("CALENDARIO").unwrap();
            sheet.write_string(0, 0, "DATA").unwrap();
            sheet.write_string(0, 1, "FATURAMENTO").unwrap();
            sheet.write_string(0, 2, "SEGMENTO").unwrap();
            sheet.write_number(1, 0, 45294.0).unwrap();
            sheet.write_number(1, 1, 10.5).unwrap();
            sheet.write_string(1, 2, " Varejo ").unwrap();
            sheet.write_string(2, 0, "02/01/2024").unwrap();
        }
        book.save(&path).unwrap();

        let mut excel = Excel::open(&path).unwrap();
        let sheet = excel.sheet("CALENDARIO").unwrap();
        assert_eq!(sheet.name(), "CALENDARIO");
        assert_eq!(sheet.column("SEGMENTO"), Ok(2));
        assert_eq!(sheet.len(), 2);
        let rows = sheet.rows().collect::<Vec<_>>();
        assert_eq!(rows[0].0, 2);
        assert_eq!(cell(rows[0].1, 0), &Cell::Number(45294.0));
        assert_eq!(cell(rows[0].1, 2), &Cell::Text("Varejo".to_string()));
        assert_eq!(cell(rows[1].1, 0), &Cell::Text("02/01/2024".to_string()));
        assert_eq!(cell(rows[1].1, 1), &Cell::Empty);
        assert_eq!(
            excel.sheet("GLOSAS"),
            Err(LoadError::MissingSheet {
                sheet: "GLOSAS".to_string(),
            })
        );
    }

    #[test]
    fn missing_file() {
        let err = Excel::open(Path::new("/nonexistent/book.xlsx")).err().unwrap();
        assert!(matches!(err, LoadError::Open { .. }));
    }
}
