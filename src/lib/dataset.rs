//! The loaded tables and the choices they offer to the filters

use std::collections::BTreeSet;

use crate::lib::{
    date::Period,
    entry::{BillingRecord, DeductionRecord, Selection},
};

/// Billing calendar and daily deductions, as read from one workbook
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<BillingRecord>,
    deductions: Vec<DeductionRecord>,
    bounds: Period,
}

impl Dataset {
    /// Sort the records by date and compute the data bounds
    ///
    /// `None` when there is no record at all: an empty calendar has no
    /// dates to pick a range from.
    pub fn new(mut records: Vec<BillingRecord>, mut deductions: Vec<DeductionRecord>) -> Option<Self> {
        records.sort_by_key(|r| r.date);
        deductions.sort_by_key(|d| d.date);
        let bounds = Period {
            start: records.first()?.date,
            end: records.last()?.date,
        };
        Some(Self {
            records,
            deductions,
            bounds,
        })
    }

    pub fn records(&self) -> &[BillingRecord] {
        &self.records
    }

    pub fn deductions(&self) -> &[DeductionRecord] {
        &self.deductions
    }

    /// First and last dates of the calendar
    pub fn bounds(&self) -> Period {
        self.bounds
    }

    pub fn options(&self) -> Options {
        let distinct = |field: fn(&BillingRecord) -> &str| {
            self.records
                .iter()
                .map(|r| field(r).to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
        };
        let mut months = self
            .records
            .iter()
            .map(|r| r.month.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        months.sort_by_key(|m| m.parse::<u32>().unwrap_or(u32::MAX));
        Options {
            bounds: self.bounds,
            segments: distinct(|r| r.segment.as_str()),
            coordinators: distinct(|r| r.coordinator.as_str()),
            months,
        }
    }
}

/// What the filter controls can be set to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub bounds: Period,
    /// sorted distinct segments
    pub segments: Vec<String>,
    /// sorted distinct coordinators
    pub coordinators: Vec<String>,
    /// distinct month labels, in calendar order
    pub months: Vec<String>,
}

impl Options {
    /// `Todos` followed by the segments
    pub fn segment_choices(&self) -> Vec<String> {
        with_all(&self.segments)
    }

    /// `Todos` followed by the coordinators
    pub fn coordinator_choices(&self) -> Vec<String> {
        with_all(&self.coordinators)
    }
}

fn with_all(labels: &[String]) -> Vec<String> {
    std::iter::once(Selection::ALL_LABEL.to_string())
        .chain(labels.iter().cloned())
        .collect()
}
