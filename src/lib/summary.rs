//! Aggregates computed over a filtered view
//!
//! All functions here are total: they expect a view that was already
//! validated and simply fold it.

use std::collections::BTreeMap;
use std::fmt;

use crate::lib::{
    date::{Date, Weekday},
    entry::{Amount, BillingRecord, DeductionRecord},
    filter::View,
};

/// Width of the trailing moving average window, in days of data
pub const WINDOW: usize = 3;

pub fn total_revenue(view: &View) -> Amount {
    view.iter().map(|r| r.revenue).sum()
}

/// Relative change from a previous period
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    Percent(f64),
    /// no positive baseline to compare with
    NotApplicable,
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Percent(p) => write!(f, "{:.2}%", p),
            Delta::NotApplicable => write!(f, "N/A"),
        }
    }
}

pub fn delta_percent(current: Amount, previous: Amount) -> Delta {
    if previous.is_positive() {
        let (cur, prev) = (current.to_f64(), previous.to_f64());
        Delta::Percent((cur - prev) / prev * 100.0)
    } else {
        Delta::NotApplicable
    }
}

/// Revenue and deductions of a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPoint {
    pub date: Date,
    pub revenue: Amount,
    pub deductions: Amount,
}

fn revenue_per_day(view: &View) -> BTreeMap<Date, Amount> {
    let mut days = BTreeMap::new();
    for rec in view.iter() {
        *days.entry(rec.date).or_insert(Amount::ZERO) += rec.revenue;
    }
    days
}

/// Daily revenue of the view, next to the deductions of the same day
///
/// Days without deductions count as zero. Deductions on days absent
/// from the view are ignored.
pub fn daily_revenue(view: &View, deductions: &[DeductionRecord]) -> Vec<DailyPoint> {
    let mut deducted = BTreeMap::new();
    for ded in deductions {
        *deducted.entry(ded.date).or_insert(Amount::ZERO) += ded.amount;
    }
    revenue_per_day(view)
        .into_iter()
        .map(|(date, revenue)| DailyPoint {
            date,
            revenue,
            deductions: deducted.get(&date).copied().unwrap_or(Amount::ZERO),
        })
        .collect()
}

/// Revenue of one category label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub label: String,
    pub revenue: Amount,
}

fn group_by<F>(view: &View, key: F) -> Vec<Group>
where
    F: Fn(&BillingRecord) -> &str,
{
    let mut groups = BTreeMap::<&str, Amount>::new();
    for rec in view.iter() {
        *groups.entry(key(rec)).or_insert(Amount::ZERO) += rec.revenue;
    }
    groups
        .into_iter()
        .map(|(label, revenue)| Group {
            label: label.to_string(),
            revenue,
        })
        .collect()
}

pub fn by_segment(view: &View) -> Vec<Group> {
    group_by(view, |r| r.segment.as_str())
}

pub fn by_coordinator(view: &View) -> Vec<Group> {
    group_by(view, |r| r.coordinator.as_str())
}

pub fn by_supervisor(view: &View) -> Vec<Group> {
    group_by(view, |r| r.supervisor.as_str())
}

/// Trailing simple moving average
///
/// The first `window - 1` positions have no value.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}

/// Mean of the smoothed daily revenue for one day of the week
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekdayAverage {
    pub weekday: Weekday,
    /// `None` when no day of the view has a moving average on that weekday
    pub average: Option<f64>,
}

/// Moving average of the daily revenue, averaged per weekday
///
/// Always seven rows, Monday to Sunday.
pub fn weekday_moving_average(view: &View) -> [WeekdayAverage; 7] {
    let days = revenue_per_day(view);
    let values = days.values().map(|a| a.to_f64()).collect::<Vec<_>>();
    let smoothed = moving_average(&values, WINDOW);
    let mut sums = [(0.0, 0usize); 7];
    for (date, avg) in days.keys().zip(smoothed) {
        if let Some(avg) = avg {
            let slot = &mut sums[Weekday::of(*date) as usize];
            slot.0 += avg;
            slot.1 += 1;
        }
    }
    Weekday::ALL.map(|weekday| {
        let (sum, count) = sums[weekday as usize];
        WeekdayAverage {
            weekday,
            average: if count > 0 {
                Some(sum / count as f64)
            } else {
                None
            },
        }
    })
}
