//! Narrowing the billing calendar down to what the user selected

use std::fmt;

use crate::lib::{
    date::Period,
    entry::{BillingRecord, Selection},
};

/// Date range and category filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    pub period: Period,
    pub segment: Selection,
    pub coordinator: Selection,
}

impl Criteria {
    /// No category narrowing
    pub fn new(period: Period) -> Self {
        Self {
            period,
            segment: Selection::All,
            coordinator: Selection::All,
        }
    }

    pub fn with_segment(mut self, segment: Selection) -> Self {
        self.segment = segment;
        self
    }

    pub fn with_coordinator(mut self, coordinator: Selection) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Same categories, one month earlier
    pub fn previous(&self) -> Self {
        Self {
            period: self.period.previous_month(),
            ..self.clone()
        }
    }

    fn keeps(&self, record: &BillingRecord) -> bool {
        self.period.contains(record.date)
            && self.segment.matches(&record.segment)
            && self.coordinator.matches(&record.coordinator)
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} segment={} coordinator={}",
            self.period, self.segment, self.coordinator
        )
    }
}

/// Records retained by a filter, in calendar order
#[derive(Debug, Clone)]
pub struct View<'d> {
    records: Vec<&'d BillingRecord>,
}

impl<'d> View<'d> {
    pub fn iter(&self) -> impl Iterator<Item = &'d BillingRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Keep the records inside the period that match both category filters
pub fn filter<'d>(records: &'d [BillingRecord], criteria: &Criteria) -> View<'d> {
    View {
        records: records.iter().filter(|r| criteria.keeps(r)).collect(),
    }
}

/// Baseline for the period-over-period comparison
pub fn previous<'d>(records: &'d [BillingRecord], criteria: &Criteria) -> View<'d> {
    filter(records, &criteria.previous())
}
