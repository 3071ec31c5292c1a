//! Everything that faces the user: text report, charts, error reports and
//! the interactive session

pub mod plot;
pub mod session;
pub mod table;

use std::fmt::Write;

use crate::lib::{
    dataset::Options,
    date::RangeError,
    error::Record,
    filter::Criteria,
    report::Report,
};
use crate::load::error::LoadError;
use table::Table;

pub const METRIC: &str = "Faturamento Total";
pub const NO_DATA: &str = "Nenhum dado disponível para os filtros selecionados.";

/// Headline number of the dashboard
pub fn metric(report: &Report) -> String {
    format!(
        "{}  ({})\n{}  {} vs {}\n",
        METRIC,
        report.criteria.period.short_label(),
        report.total,
        report.delta,
        report.previous_period.short_label(),
    )
}

/// Full text report: filters, metric and one table per chart
pub fn render_report(report: &Report) -> String {
    let crit = &report.criteria;
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = writeln!(
        out,
        "Período: {}  Segmento: {}  Coordenador: {}\n",
        crit.period.short_label(),
        crit.segment,
        crit.coordinator
    );
    out.push_str(&metric(report));
    let tables = [
        Table::daily(report),
        Table::breakdown("Faturamento por segmento", "Segmento", &report.segments),
        Table::breakdown(
            "Faturamento por coordenador",
            "Coordenador",
            &report.coordinators,
        ),
        Table::breakdown(
            "Faturamento por supervisor",
            "Supervisor",
            &report.supervisors,
        ),
        Table::weekdays(&report.weekdays),
    ];
    for table in &tables {
        let _ = write!(out, "\n{}", table);
    }
    if let Some(trend) = &report.trend {
        let _ = writeln!(
            out,
            "\nTendência das glosas: {:+.2} por dia (base {:.2})",
            trend.line.slope, trend.line.intercept
        );
    }
    out
}

/// Filter choices offered by the loaded data
pub fn render_options(options: &Options) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Datas: {} .. {}",
        options.bounds.start, options.bounds.end
    );
    let _ = writeln!(out, "Meses: {}", options.months.join(", "));
    let _ = writeln!(out, "Segmentos: {}", options.segment_choices().join(", "));
    let _ = writeln!(
        out,
        "Coordenadores: {}",
        options.coordinator_choices().join(", ")
    );
    out
}

pub fn load_error(errs: &mut Record, err: &LoadError) {
    errs.make(err.label()).text(err).hint(err.fix_hint());
}

pub fn range_error(errs: &mut Record, err: &RangeError) {
    errs.make("Invalid period").text(err).hint(err.fix_hint());
}

pub fn empty_view(errs: &mut Record, criteria: &Criteria) {
    errs.make("No data")
        .nonfatal()
        .text(NO_DATA)
        .text(format!("filters: {}", criteria))
        .hint(format!(
            "widen the period or select '{}'",
            crate::lib::entry::Selection::ALL_LABEL
        ));
}

#[cfg(test)]
pub(crate) fn sample_dataset() -> crate::lib::dataset::Dataset {
    use crate::lib::{
        dataset::Dataset,
        date::Date,
        entry::{Amount, BillingRecord, DeductionRecord},
    };
    let day = |m, d| Date::from_ymd_opt(2024, m, d).unwrap();
    let mut records = Vec::new();
    for d in 1..=31 {
        records.push(BillingRecord::new(day(1, d), Amount(100_00), "Varejo", "Ana", "Carla"));
    }
    for d in 1..=10 {
        records.push(BillingRecord::new(day(2, d), Amount(150_00), "Varejo", "Ana", "Carla"));
        records.push(BillingRecord::new(day(2, d), Amount(50_00), "Atacado", "Bruno", "Davi"));
    }
    let deductions = (1..=10)
        .map(|d| DeductionRecord {
            date: day(2, d),
            amount: Amount(d as i64 * 10_00),
        })
        .collect();
    Dataset::new(records, deductions).unwrap()
}

/// February 1st to 10th, both segments
#[cfg(test)]
pub(crate) fn sample_report() -> Report {
    use crate::lib::{date::Date, date::Period, report::Outcome};
    let period = Period::new(
        Date::from_ymd_opt(2024, 2, 1).unwrap(),
        Date::from_ymd_opt(2024, 2, 10).unwrap(),
    )
    .unwrap();
    match Report::build(&sample_dataset(), Criteria::new(period)) {
        Outcome::Ready(report) => *report,
        Outcome::Empty(_) => panic!("sample report is empty"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lib::entry::Selection;

    #[test]
    fn headline() {
        let out = metric(&sample_report());
        assert_eq!(
            out,
            "Faturamento Total  (01/02 até 10/02)\nR$ 2.000,00  100.00% vs 01/01 até 10/01\n"
        );
    }

    #[test]
    fn full_report() {
        let out = render_report(&sample_report());
        assert!(out.starts_with("Período: 01/02 até 10/02  Segmento: Todos  Coordenador: Todos"));
        for title in [
            "Faturamento diário",
            "Faturamento por segmento",
            "Faturamento por coordenador",
            "Faturamento por supervisor",
            "Média móvel por dia da semana",
        ] {
            assert!(out.contains(title), "missing {}", title);
        }
        assert!(out.contains("Tendência das glosas: +10.00 por dia"));
    }

    #[test]
    fn options_listing() {
        let out = render_options(&sample_dataset().options());
        assert!(out.contains("Datas: 2024-01-01 .. 2024-02-10"));
        assert!(out.contains("Meses: 1, 2"));
        assert!(out.contains("Segmentos: Todos, Atacado, Varejo"));
        assert!(out.contains("Coordenadores: Todos, Ana, Bruno"));
    }

    #[test]
    fn errors_to_record() {
        let mut errs = Record::new();
        empty_view(&mut errs, &sample_report().criteria.with_segment(Selection::parse("x")));
        assert!(!errs.is_fatal());
        assert!(errs.to_string().contains(NO_DATA));
        range_error(&mut errs, &RangeError::Malformed("2024".to_string()));
        load_error(
            &mut errs,
            &LoadError::MissingSheet {
                sheet: "CALENDARIO".to_string(),
            },
        );
        assert!(errs.is_fatal());
        assert_eq!(errs.count_errors(), 2);
        let out = errs.to_string();
        assert!(out.contains("Missing sheet"));
        assert!(out.contains("'2024' is not a valid date range"));
    }
}
