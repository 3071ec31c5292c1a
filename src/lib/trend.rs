//! Linear trend of the daily deductions
//!
//! A plain least-squares fit drawn over the daily chart when the selected
//! period stops in the middle of a month. It is a visual aid, not a forecast.

use crate::lib::{date::{Date, Period}, summary::DailyPoint};

/// `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub slope: f64,
    pub intercept: f64,
}

impl Line {
    /// First-degree least-squares fit
    ///
    /// `None` with fewer than two points or when all `x` coincide.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (x, y) in points {
            sxy += (x - mean_x) * (y - mean_y);
            sxx += (x - mean_x) * (x - mean_x);
        }
        if sxx == 0.0 {
            return None;
        }
        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fitted deductions over the dates of the daily series
#[derive(Debug, Clone, PartialEq)]
pub struct Trend {
    pub line: Line,
    pub points: Vec<(Date, f64)>,
}

/// Whether a trend is drawn at all for this period and series
pub fn applies(period: Period, daily: &[DailyPoint]) -> bool {
    period.is_partial_month() && daily.len() > 1
}

/// Fit the daily deductions against the days elapsed since the first point
pub fn fit_trend(daily: &[DailyPoint], period: Period) -> Option<Trend> {
    if !applies(period, daily) {
        return None;
    }
    let origin = daily.first()?.date;
    let offsets = daily
        .iter()
        .map(|p| (p.date - origin).num_days() as f64)
        .collect::<Vec<_>>();
    let points = offsets
        .iter()
        .zip(daily)
        .map(|(x, p)| (*x, p.deductions.to_f64()))
        .collect::<Vec<_>>();
    let line = Line::fit(&points)?;
    Some(Trend {
        line,
        points: daily
            .iter()
            .zip(offsets)
            .map(|(p, x)| (p.date, line.at(x)))
            .collect(),
    })
}
