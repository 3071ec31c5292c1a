//! Box-drawn tables for the terminal

use std::fmt;

use crate::lib::{
    entry::Amount,
    report::Report,
    summary::{moving_average, Group, WeekdayAverage, WINDOW},
};

/// A titled grid: one column of row labels followed by value columns
pub struct Table {
    title: String,
    labels: ColFmt,
    columns: Vec<ColFmt>,
}

struct BoxFmt {
    width: usize,
    text: String,
}

struct ColFmt {
    width: usize,
    label: BoxFmt,
    boxes: Vec<BoxFmt>,
}

impl Table {
    fn with_columns(title: &str, corner: &str, headers: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            labels: ColFmt::with_label(BoxFmt::from(corner.to_string())),
            columns: headers
                .iter()
                .map(|h| ColFmt::with_label(BoxFmt::from(h.to_string())))
                .collect(),
        }
    }

    fn push_line(&mut self, label: BoxFmt, boxes: Vec<BoxFmt>) {
        self.labels.push(label);
        for (i, b) in boxes.into_iter().enumerate() {
            self.columns[i].push(b);
        }
    }

    /// Revenue per category label, with its share of the total
    pub fn breakdown(title: &str, key: &str, groups: &[Group]) -> Self {
        let total = groups.iter().map(|g| g.revenue).sum::<Amount>();
        let mut table = Self::with_columns(title, key, &["Faturamento", "Part."]);
        for g in groups {
            table.push_line(
                BoxFmt::from(g.label.clone()),
                vec![BoxFmt::amount(g.revenue), BoxFmt::share(g.revenue, total)],
            );
        }
        table
    }

    /// Daily revenue with its moving average, deductions and their trend
    pub fn daily(report: &Report) -> Self {
        let revenue = report
            .daily
            .iter()
            .map(|d| d.revenue.to_f64())
            .collect::<Vec<_>>();
        let smoothed = moving_average(&revenue, WINDOW);
        let mut headers = vec!["Faturamento", "Média 3d", "Glosas"];
        if report.trend.is_some() {
            headers.push("Tendência");
        }
        let mut table = Self::with_columns("Faturamento diário", "Data", &headers);
        for (i, (day, avg)) in report.daily.iter().zip(smoothed).enumerate() {
            let mut line = vec![
                BoxFmt::amount(day.revenue),
                BoxFmt::optional(avg),
                BoxFmt::deduction(day.deductions),
            ];
            if let Some(trend) = &report.trend {
                line.push(BoxFmt::optional(trend.points.get(i).map(|p| p.1)));
            }
            table.push_line(BoxFmt::from(day.date.format("%d/%m/%Y").to_string()), line);
        }
        table
    }

    /// Moving average of the daily revenue per weekday
    pub fn weekdays(weekdays: &[WeekdayAverage]) -> Self {
        let mut table = Self::with_columns(
            "Média móvel por dia da semana",
            "Dia",
            &["Média móvel"],
        );
        for w in weekdays {
            table.push_line(
                BoxFmt::from(w.weekday.label().to_string()),
                vec![BoxFmt::optional(w.average)],
            );
        }
        table
    }

    /// Characters between the outer borders
    fn inner_width(&self) -> usize {
        self.columns
            .iter()
            .fold(self.labels.width + 2, |acc, c| acc + c.width + 3)
    }
}

impl BoxFmt {
    fn from(text: String) -> Self {
        let width = text.chars().count();
        Self { text, width }
    }

    fn amount(a: Amount) -> Self {
        Self::from(a.to_string())
    }

    /// Days without deductions are left blank
    fn deduction(a: Amount) -> Self {
        if a.nonzero() {
            Self::amount(a)
        } else {
            Self::from(String::new())
        }
    }

    fn optional(v: Option<f64>) -> Self {
        match v {
            Some(v) => Self::amount(Amount::from_f64(v)),
            None => Self::from("-".to_string()),
        }
    }

    fn share(part: Amount, total: Amount) -> Self {
        if total.is_positive() {
            Self::from(format!("{:.1}%", part.to_f64() / total.to_f64() * 100.0))
        } else {
            Self::from("-".to_string())
        }
    }
}

impl ColFmt {
    fn with_label(label: BoxFmt) -> Self {
        Self {
            width: label.width,
            label,
            boxes: Vec::new(),
        }
    }

    fn push(&mut self, b: BoxFmt) {
        self.width = self.width.max(b.width);
        self.boxes.push(b);
    }

    fn len(&self) -> usize {
        self.boxes.len()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let title = BoxFmt::from(self.title.clone());
        let natural = self.inner_width();
        // a long title widens the label column
        let lwidth = self.labels.width + (title.width + 2).saturating_sub(natural);
        let inner = natural.max(title.width + 2);
        // title block
        writeln!(f, "{}{}{}", ULCORNER, hline(inner), URCORNER)?;
        write!(f, "{}", VLINE)?;
        title.write(f, inner - 2, false)?;
        writeln!(f, "{}", VLINE)?;
        self.separator(f, lwidth, (RTJOIN, LOJOIN, LTJOIN))?;
        // header line
        write!(f, "{}", VLINE)?;
        self.labels.label.write(f, lwidth, false)?;
        for c in &self.columns {
            write!(f, "{}", VLINE)?;
            c.label.write(f, c.width, true)?;
        }
        writeln!(f, "{}", VLINE)?;
        self.separator(f, lwidth, (RTJOIN, CROSS, LTJOIN))?;
        // main block
        for idx in 0..self.labels.len() {
            write!(f, "{}", VLINE)?;
            self.labels.boxes[idx].write(f, lwidth, false)?;
            for c in &self.columns {
                write!(f, "{}", VLINE)?;
                c.boxes[idx].write(f, c.width, true)?;
            }
            writeln!(f, "{}", VLINE)?;
        }
        // lower border
        self.separator(f, lwidth, (DLCORNER, HIJOIN, DRCORNER))
    }
}

impl Table {
    fn separator(
        &self,
        f: &mut fmt::Formatter,
        lwidth: usize,
        (left, join, right): (&str, &str, &str),
    ) -> fmt::Result {
        write!(f, "{}{}", left, hline(lwidth + 2))?;
        for c in &self.columns {
            write!(f, "{}{}", join, hline(c.width + 2))?;
        }
        writeln!(f, "{}", right)
    }
}

fn hline(len: usize) -> String {
    HLINE.repeat(len)
}

const HLINE: &str = "─";
const VLINE: &str = "│";
const ULCORNER: &str = "┌";
const URCORNER: &str = "┐";
const DLCORNER: &str = "└";
const DRCORNER: &str = "┘";
const LTJOIN: &str = "┤";
const RTJOIN: &str = "├";
const HIJOIN: &str = "┴";
const LOJOIN: &str = "┬";
const CROSS: &str = "┼";

impl BoxFmt {
    fn write(&self, f: &mut fmt::Formatter, width: usize, right: bool) -> fmt::Result {
        let padding = " ".repeat(width.saturating_sub(self.width));
        if right {
            write!(f, " {}{} ", padding, self.text)
        } else {
            write!(f, " {}{} ", self.text, padding)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cli::sample_report;
    use crate::lib::date::Weekday;

    fn widths(rendered: &str) -> Vec<usize> {
        rendered.lines().map(|l| l.chars().count()).collect()
    }

    #[test]
    fn aligned_grid() {
        let groups = vec![
            Group {
                label: "Atacado".to_string(),
                revenue: Amount(500_00),
            },
            Group {
                label: "Varejo".to_string(),
                revenue: Amount(1_500_00),
            },
        ];
        let out = Table::breakdown("Faturamento por segmento", "Segmento", &groups).to_string();
        let w = widths(&out);
        assert_eq!(w.len(), 8);
        assert!(w.iter().all(|&x| x == w[0]));
        assert!(out.contains("│ Faturamento por segmento"));
        assert!(out.contains("R$ 1.500,00 │ 75.0% │"));
        assert!(out.starts_with('┌'));
        assert!(out.trim_end().ends_with('┘'));
    }

    #[test]
    fn long_title_widens() {
        let out = Table::weekdays(&Weekday::ALL.map(|weekday| WeekdayAverage {
            weekday,
            average: None,
        }))
        .to_string();
        let w = widths(&out);
        assert_eq!(w.len(), 13);
        assert!(w.iter().all(|&x| x == w[0]));
        assert!(out.contains("│ Domingo "));
        assert!(out.contains(" - │"));
    }

    #[test]
    fn daily_columns() {
        let report = sample_report();
        let out = Table::daily(&report).to_string();
        assert!(out.contains("Tendência"));
        assert!(out.contains("│ 01/02/2024 "));
        assert_eq!(out.lines().count(), report.daily.len() + 6);
        let w = widths(&out);
        assert!(w.iter().all(|&x| x == w[0]));
    }
}
