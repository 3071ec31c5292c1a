//! One full run of the pipeline for a set of filters

use tracing::debug;

use crate::lib::{
    dataset::Dataset,
    date::Period,
    entry::Amount,
    filter::{self, Criteria},
    summary::{self, DailyPoint, Delta, Group, WeekdayAverage},
    trend::{self, Trend},
};

/// Everything the dashboard shows for one set of filters
#[derive(Debug, Clone)]
pub struct Report {
    pub criteria: Criteria,
    pub previous_period: Period,
    pub total: Amount,
    pub previous_total: Amount,
    pub delta: Delta,
    pub daily: Vec<DailyPoint>,
    pub segments: Vec<Group>,
    pub coordinators: Vec<Group>,
    pub supervisors: Vec<Group>,
    pub weekdays: [WeekdayAverage; 7],
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// nothing matches the filters, nothing to aggregate
    Empty(Criteria),
    Ready(Box<Report>),
}

impl Report {
    /// Filter, aggregate and fit
    ///
    /// The criteria are expected to be validated against the data bounds.
    pub fn build(data: &Dataset, criteria: Criteria) -> Outcome {
        let view = filter::filter(data.records(), &criteria);
        if view.is_empty() {
            debug!("no record matches {}", criteria);
            return Outcome::Empty(criteria);
        }
        let baseline = filter::previous(data.records(), &criteria);
        let total = summary::total_revenue(&view);
        let previous_total = summary::total_revenue(&baseline);
        let daily = summary::daily_revenue(&view, data.deductions());
        let trend = trend::fit_trend(&daily, criteria.period);
        debug!(
            records = view.len(),
            baseline = baseline.len(),
            days = daily.len(),
            trend = trend.is_some(),
            "aggregated {}",
            criteria
        );
        Outcome::Ready(Box::new(Report {
            previous_period: criteria.period.previous_month(),
            total,
            previous_total,
            delta: summary::delta_percent(total, previous_total),
            segments: summary::by_segment(&view),
            coordinators: summary::by_coordinator(&view),
            supervisors: summary::by_supervisor(&view),
            weekdays: summary::weekday_moving_average(&view),
            daily,
            trend,
            criteria,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lib::{
        date::Date,
        entry::{BillingRecord, DeductionRecord, Selection},
    };

    macro_rules! dt {
        ( $m:tt - $d:tt ) => {
            Date::from_ymd_opt(2024, $m, $d).unwrap()
        };
    }

    fn dataset() -> Dataset {
        let mut records = Vec::new();
        for d in 1..=31 {
            records.push(BillingRecord::new(dt!(1 - d), Amount(100_00), "Varejo", "Ana", "Carla"));
        }
        for d in 1..=10 {
            records.push(BillingRecord::new(dt!(2 - d), Amount(150_00), "Varejo", "Ana", "Carla"));
            records.push(BillingRecord::new(dt!(2 - d), Amount(50_00), "Atacado", "Bruno", "Davi"));
        }
        let deductions = (1..=10)
            .map(|d| DeductionRecord { date: dt!(2 - d), amount: Amount(d as i64 * 10_00) })
            .collect();
        Dataset::new(records, deductions).unwrap()
    }

    fn ready(outcome: Outcome) -> Report {
        match outcome {
            Outcome::Ready(report) => *report,
            Outcome::Empty(crit) => panic!("{} should not be empty", crit),
        }
    }

    #[test]
    fn partial_month_report() {
        let data = dataset();
        let crit = Criteria::new(Period::new(dt!(2 - 1), dt!(2 - 10)).unwrap());
        let report = ready(Report::build(&data, crit));
        assert_eq!(report.total, Amount(2_000_00));
        assert_eq!(report.previous_total, Amount(1_000_00));
        assert_eq!(report.delta, Delta::Percent(100.0));
        assert_eq!(
            report.previous_period,
            Period::new(dt!(1 - 1), dt!(1 - 10)).unwrap()
        );
        assert_eq!(report.daily.len(), 10);
        assert_eq!(report.daily[4].deductions, Amount(50_00));
        assert_eq!(report.segments.len(), 2);
        assert_eq!(report.weekdays.len(), 7);
        let trend = report.trend.unwrap();
        assert!((trend.line.slope - 10.0).abs() < 1e-9);
    }

    #[test]
    fn whole_month_has_no_trend_nor_baseline() {
        let data = dataset();
        let crit = Criteria::new(Period::new(dt!(1 - 1), dt!(1 - 31)).unwrap());
        let report = ready(Report::build(&data, crit));
        assert!(report.trend.is_none());
        assert_eq!(report.previous_total, Amount::ZERO);
        assert_eq!(report.delta, Delta::NotApplicable);
        assert_eq!(report.daily.iter().map(|d| d.deductions).sum::<Amount>(), Amount::ZERO);
    }

    #[test]
    fn narrowing_to_nothing() {
        let data = dataset();
        let crit = Criteria::new(Period::new(dt!(1 - 1), dt!(1 - 31)).unwrap())
            .with_segment(Selection::parse("Atacado"));
        assert!(matches!(Report::build(&data, crit), Outcome::Empty(_)));
    }

    #[test]
    fn narrowed_baseline() {
        let data = dataset();
        let crit = Criteria::new(Period::new(dt!(2 - 1), dt!(2 - 10)).unwrap())
            .with_coordinator(Selection::parse("Bruno"));
        let report = ready(Report::build(&data, crit));
        assert_eq!(report.total, Amount(500_00));
        assert_eq!(report.delta, Delta::NotApplicable);
        assert_eq!(report.supervisors.len(), 1);
        assert_eq!(report.supervisors[0].label, "Davi");
    }
}
