//! Reading the billing workbook
//!
//! Sheet and column names are fixed by the workbook layout.

pub mod cache;
pub mod error;
pub mod sheet;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::lib::{
    dataset::Dataset,
    date::{parse_date, Date},
    entry::{Amount, BillingRecord, DeductionRecord},
};
use cache::Source;
use error::LoadError;
use sheet::{cell, Cell, Excel, Sheet, Workbook};

pub const DEFAULT_WORKBOOK: &str = "BASES FATUROMETRO.xlsx";

pub const CALENDAR_SHEET: &str = "CALENDARIO";
pub const DEDUCTION_SHEETS: [&str; 3] = [
    "INTRA-HORA CARTÃO",
    "INTRA-HORA CIDADÃO",
    "INTRA-HORA STE",
];

pub const DATE: &str = "DATA";
pub const REVENUE: &str = "FATURAMENTO";
pub const SEGMENT: &str = "SEGMENTO";
pub const COORDINATOR: &str = "COORDENADOR";
pub const SUPERVISOR: &str = "SUPERVISOR";
pub const DEDUCTION: &str = "GLOSAS";

/// Identity of the dataset read from `path`, for the cache
pub fn source(path: &Path) -> Source {
    let sheets = std::iter::once(CALENDAR_SHEET)
        .chain(DEDUCTION_SHEETS)
        .collect::<Vec<_>>();
    Source::new(path, sheets.as_slice())
}

/// Open the workbook file and read both tables
pub fn open_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let mut book = Excel::open(path)?;
    read_dataset(&mut book)
}

pub fn read_dataset<W>(book: &mut W) -> Result<Dataset, LoadError>
where
    W: Workbook,
{
    let records = read_records(book)?;
    let deductions = read_deductions(book)?;
    info!(
        records = records.len(),
        deduction_days = deductions.len(),
        "dataset loaded"
    );
    Dataset::new(records, deductions).ok_or_else(|| LoadError::EmptyDataset {
        sheet: CALENDAR_SHEET.to_string(),
    })
}

/// Complete rows of the billing calendar, by ascending date
pub fn read_records<W>(book: &mut W) -> Result<Vec<BillingRecord>, LoadError>
where
    W: Workbook,
{
    let sheet = book.sheet(CALENDAR_SHEET)?;
    let cols = [DATE, REVENUE, SEGMENT, COORDINATOR, SUPERVISOR]
        .iter()
        .map(|c| sheet.column(c))
        .collect::<Result<Vec<_>, _>>()?;
    let mut records = Vec::new();
    for (row, cells) in sheet.rows() {
        let fields = cols.iter().map(|&c| cell(cells, c)).collect::<Vec<_>>();
        if fields.iter().any(|c| c.is_empty()) {
            continue;
        }
        let date = to_date(&sheet, row, fields[0])?;
        let revenue = to_amount(&sheet, row, REVENUE, fields[1])?;
        records.push(BillingRecord::new(
            date,
            revenue,
            fields[2].to_string(),
            fields[3].to_string(),
            fields[4].to_string(),
        ));
    }
    debug!(
        "sheet '{}': kept {} of {} rows",
        sheet.name(),
        records.len(),
        sheet.len()
    );
    records.sort_by_key(|r| r.date);
    Ok(records)
}

/// Deductions of all deduction sheets, summed per day
pub fn read_deductions<W>(book: &mut W) -> Result<Vec<DeductionRecord>, LoadError>
where
    W: Workbook,
{
    let mut per_day = BTreeMap::<Date, Amount>::new();
    for name in DEDUCTION_SHEETS {
        let sheet = book.sheet(name)?;
        let date_col = sheet.column(DATE)?;
        let amount_col = sheet.column(DEDUCTION)?;
        let mut kept = 0;
        for (row, cells) in sheet.rows() {
            let (date, amount) = (cell(cells, date_col), cell(cells, amount_col));
            if date.is_empty() || amount.is_empty() {
                continue;
            }
            let date = to_date(&sheet, row, date)?;
            let amount = to_amount(&sheet, row, DEDUCTION, amount)?;
            *per_day.entry(date).or_insert(Amount::ZERO) += amount;
            kept += 1;
        }
        debug!("sheet '{}': kept {} of {} rows", name, kept, sheet.len());
    }
    Ok(per_day
        .into_iter()
        .map(|(date, amount)| DeductionRecord { date, amount })
        .collect())
}

/// Serial number of 9999-12-31, the last date a spreadsheet can hold
const MAX_SERIAL: f64 = 2_958_465.0;

/// Days between the spreadsheet epoch and a serial date
fn from_serial(serial: f64) -> Option<Date> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = Date::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(chrono::Days::new(serial.floor() as u64))
}

fn to_date(sheet: &Sheet, row: usize, value: &Cell) -> Result<Date, LoadError> {
    let date = match value {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => from_serial(*n),
        Cell::Text(s) => parse_date(s),
        Cell::Empty => None,
    };
    date.ok_or_else(|| LoadError::BadDate {
        sheet: sheet.name().to_string(),
        row,
        value: value.to_string(),
    })
}

/// Dots used only to group thousands, as in `1.234` or `12.345.678`
fn is_grouped(text: &str) -> bool {
    let mut groups = text.trim_start_matches('-').split('.');
    let head = groups.next().unwrap_or_default();
    let digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    let mut tail = groups.peekable();
    tail.peek().is_some()
        && (1..=3).contains(&head.len())
        && !head.starts_with('0')
        && digits(head)
        && tail.all(|g| g.len() == 3 && digits(g))
}

/// Read `1234.56`, `1.234,56`, `1.234` or `R$ 1.234,56`
fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim().trim_start_matches("R$").trim();
    let normalized = if text.contains(',') {
        text.replace('.', "").replace(',', ".")
    } else if is_grouped(text) {
        text.replace('.', "")
    } else {
        text.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn to_amount(sheet: &Sheet, row: usize, column: &str, value: &Cell) -> Result<Amount, LoadError> {
    let amount = match value {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => parse_amount(s),
        _ => None,
    };
    amount.map(Amount::from_f64).ok_or_else(|| LoadError::BadAmount {
        sheet: sheet.name().to_string(),
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}
