//! SVG charts of a report
//!
//! Every chart is drawn in a `WIDTH x HEIGHT` frame surrounded by a margin
//! that holds the title and the axis labels.

use std::io;
use std::path::{Path, PathBuf};

use svg::{
    node::element::{path::Data, Circle, Line, Path as SvgPath, Rectangle, Text},
    Document,
};
use tracing::info;

use crate::lib::{
    date::Date,
    entry::Amount,
    report::Report,
    summary::{Group, WeekdayAverage},
};

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN: f64 = 80.0;
const STROKE: f64 = 2.0;

const COLORS: &[&str] = &[
    "#1f77b4", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf", "#bcbd22",
];
const AREA: &str = "#1f77b4";
const TREND: &str = "orange";

/// Write all charts of `report` into `dir`, returns the files written
pub fn render(report: &Report, dir: &Path) -> io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let charts = [
        ("daily.svg", daily_chart(report)),
        ("segment.svg", segment_chart(&report.segments)),
        ("coordinator.svg", coordinator_chart(&report.coordinators)),
        ("supervisor.svg", supervisor_chart(&report.supervisors)),
        ("weekday.svg", weekday_chart(&report.weekdays)),
    ];
    let mut written = Vec::new();
    for (name, document) in charts {
        let file = dir.join(name);
        svg::save(&file, &document)?;
        info!("wrote {}", file.display());
        written.push(file);
    }
    Ok(written)
}

fn text<S>(x: f64, y: f64, anchor: &str, contents: S) -> Text
where
    S: ToString,
{
    Text::new()
        .set("x", x)
        .set("y", y)
        .set("text-anchor", anchor)
        .set("font-family", "sans-serif")
        .set("font-size", 14.0)
        .add(svg::node::Text::new(contents.to_string()))
}

fn line(from: (f64, f64), to: (f64, f64)) -> Line {
    Line::new()
        .set("x1", from.0)
        .set("y1", from.1)
        .set("x2", to.0)
        .set("y2", to.1)
        .set("stroke", "black")
        .set("stroke-width", STROKE)
}

/// Empty chart with its title
fn frame(title: &str) -> Document {
    Document::new()
        .set(
            "viewBox",
            (-MARGIN, -MARGIN, WIDTH + 2.0 * MARGIN, HEIGHT + 2.0 * MARGIN),
        )
        .add(
            Rectangle::new()
                .set("x", -MARGIN)
                .set("y", -MARGIN)
                .set("width", WIDTH + 2.0 * MARGIN)
                .set("height", HEIGHT + 2.0 * MARGIN)
                .set("fill", "white"),
        )
        .add(text(WIDTH / 2.0, -MARGIN / 2.0, "middle", title).set("font-size", 22.0))
}

/// Map `[lo, hi]` onto `[0, len]`, degenerate ranges land in the middle
fn scale(lo: f64, hi: f64, len: f64) -> impl Fn(f64) -> f64 {
    move |v| {
        if hi > lo {
            (v - lo) / (hi - lo) * len
        } else {
            len / 2.0
        }
    }
}

fn max_revenue(groups: &[Group]) -> f64 {
    groups
        .iter()
        .map(|g| g.revenue.to_f64())
        .fold(0.0, f64::max)
}

/// Area of the daily revenue, with the deduction trend dashed on top
pub fn daily_chart(report: &Report) -> Document {
    let doc = frame("Faturamento diário");
    let (first, last) = match (report.daily.first(), report.daily.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return doc,
    };
    let trend = report
        .trend
        .as_ref()
        .map(|t| t.points.as_slice())
        .unwrap_or_default();
    let values = report
        .daily
        .iter()
        .map(|d| d.revenue.to_f64())
        .chain(trend.iter().map(|p| p.1));
    let (ymin, ymax) = values.fold((0.0, 0.0), |(lo, hi): (f64, f64), v| (lo.min(v), hi.max(v)));
    let days = |d: Date| (d - first).num_days() as f64;
    let resize_x = scale(0.0, days(last), WIDTH);
    let to_y = scale(ymin, ymax, HEIGHT);
    let resize_y = |v: f64| HEIGHT - to_y(v);
    let x_at = |d: Date| resize_x(days(d));

    let area = report
        .daily
        .iter()
        .fold(
            Data::new().move_to((x_at(first), resize_y(0.0))),
            |data, d| data.line_to((x_at(d.date), resize_y(d.revenue.to_f64()))),
        )
        .line_to((x_at(last), resize_y(0.0)))
        .close();
    let mut doc = doc.add(
        SvgPath::new()
            .set("fill", AREA)
            .set("fill-opacity", 0.4)
            .set("stroke", AREA)
            .set("stroke-width", STROKE)
            .set("d", area),
    );
    if let Some((head, tail)) = trend.split_first() {
        let data = tail.iter().fold(
            Data::new().move_to((x_at(head.0), resize_y(head.1))),
            |data, (d, v)| data.line_to((x_at(*d), resize_y(*v))),
        );
        doc = doc.add(
            SvgPath::new()
                .set("fill", "none")
                .set("stroke", TREND)
                .set("stroke-width", STROKE)
                .set("stroke-dasharray", "8,4")
                .set("d", data),
        );
    }
    doc.add(line((0.0, 0.0), (0.0, HEIGHT)))
        .add(line((0.0, resize_y(0.0)), (WIDTH, resize_y(0.0))))
        .add(text(0.0, HEIGHT + 25.0, "start", first.format("%d/%m")))
        .add(text(WIDTH, HEIGHT + 25.0, "end", last.format("%d/%m")))
        .add(text(-5.0, resize_y(ymax) + 5.0, "end", Amount::from_f64(ymax)))
}

/// One vertical bar per segment
pub fn segment_chart(groups: &[Group]) -> Document {
    let mut doc = frame("Faturamento por segmento");
    let band = WIDTH / groups.len().max(1) as f64;
    let resize_y = scale(0.0, max_revenue(groups), HEIGHT);
    for (i, g) in groups.iter().enumerate() {
        let height = resize_y(g.revenue.to_f64().max(0.0));
        let x = i as f64 * band + band * 0.15;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", HEIGHT - height)
                    .set("width", band * 0.7)
                    .set("height", height)
                    .set("fill", COLORS[i % COLORS.len()]),
            )
            .add(text(x + band * 0.35, HEIGHT + 25.0, "middle", &g.label))
            .add(text(
                x + band * 0.35,
                HEIGHT - height - 8.0,
                "middle",
                g.revenue,
            ));
    }
    doc.add(line((0.0, HEIGHT), (WIDTH, HEIGHT)))
}

/// Share of each coordinator as a pie
pub fn coordinator_chart(groups: &[Group]) -> Document {
    let mut doc = frame("Faturamento por coordenador");
    let (cx, cy, r) = (HEIGHT / 2.0, HEIGHT / 2.0, HEIGHT / 2.0);
    let slices = groups
        .iter()
        .filter(|g| g.revenue.is_positive())
        .collect::<Vec<_>>();
    let total = slices.iter().map(|g| g.revenue.to_f64()).sum::<f64>();
    let point = |angle: f64| (cx + r * angle.sin(), cy - r * angle.cos());
    let mut angle = 0.0;
    for (i, g) in slices.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];
        let share = g.revenue.to_f64() / total;
        if slices.len() == 1 {
            doc = doc.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", r)
                    .set("fill", color),
            );
        } else {
            let sweep = share * std::f64::consts::TAU;
            let (x1, y1) = point(angle);
            let (x2, y2) = point(angle + sweep);
            let large = if sweep > std::f64::consts::PI { 1 } else { 0 };
            let d = format!(
                "M {} {} L {} {} A {} {} 0 {} 1 {} {} Z",
                cx, cy, x1, y1, r, r, large, x2, y2
            );
            doc = doc.add(
                SvgPath::new()
                    .set("fill", color)
                    .set("stroke", "white")
                    .set("stroke-width", STROKE)
                    .set("d", d),
            );
            angle += sweep;
        }
        let y = 40.0 + i as f64 * 30.0;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", HEIGHT + 60.0)
                    .set("y", y - 14.0)
                    .set("width", 18.0)
                    .set("height", 18.0)
                    .set("fill", color),
            )
            .add(text(
                HEIGHT + 90.0,
                y,
                "start",
                format!("{} ({:.1}%)", g.label, share * 100.0),
            ));
    }
    doc
}

/// One horizontal bar per supervisor
pub fn supervisor_chart(groups: &[Group]) -> Document {
    let mut doc = frame("Faturamento por supervisor");
    let band = HEIGHT / groups.len().max(1) as f64;
    let resize_x = scale(0.0, max_revenue(groups), WIDTH);
    for (i, g) in groups.iter().enumerate() {
        let width = resize_x(g.revenue.to_f64().max(0.0));
        let y = i as f64 * band + band * 0.15;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", 0.0)
                    .set("y", y)
                    .set("width", width)
                    .set("height", band * 0.7)
                    .set("fill", COLORS[0]),
            )
            .add(text(5.0, y + band * 0.35 + 5.0, "start", format!("{}: {}", g.label, g.revenue)));
    }
    doc.add(line((0.0, 0.0), (0.0, HEIGHT)))
}

/// Weekday profile as a line, interrupted where a weekday has no value
pub fn weekday_chart(weekdays: &[WeekdayAverage]) -> Document {
    let mut doc = frame("Média móvel por dia da semana");
    let ymax = weekdays
        .iter()
        .filter_map(|w| w.average)
        .fold(0.0, f64::max);
    let ymin = weekdays
        .iter()
        .filter_map(|w| w.average)
        .fold(0.0, f64::min);
    let step = WIDTH / weekdays.len().max(1) as f64;
    let x_at = |i: usize| (i as f64 + 0.5) * step;
    let to_y = scale(ymin, ymax, HEIGHT);
    let resize_y = |v: f64| HEIGHT - to_y(v);
    let mut data = Data::new();
    let mut drawn = false;
    let mut previous = false;
    for (i, w) in weekdays.iter().enumerate() {
        match w.average {
            Some(avg) => {
                let pt = (x_at(i), resize_y(avg));
                data = if previous {
                    data.line_to(pt)
                } else {
                    data.move_to(pt)
                };
                doc = doc.add(
                    Circle::new()
                        .set("cx", pt.0)
                        .set("cy", pt.1)
                        .set("r", 5.0)
                        .set("fill", AREA),
                );
                drawn = true;
                previous = true;
            }
            None => previous = false,
        }
        doc = doc.add(text(x_at(i), HEIGHT + 25.0, "middle", w.weekday.label()));
    }
    if drawn {
        doc = doc.add(
            SvgPath::new()
                .set("fill", "none")
                .set("stroke", AREA)
                .set("stroke-width", STROKE)
                .set("d", data),
        );
    }
    doc.add(line((0.0, HEIGHT), (WIDTH, HEIGHT)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cli::sample_report;
    use crate::lib::date::Weekday;

    fn count(doc: &Document, tag: &str) -> usize {
        doc.to_string().matches(tag).count()
    }

    #[test]
    fn daily_has_area_and_trend() {
        let report = sample_report();
        assert!(report.trend.is_some());
        let out = daily_chart(&report).to_string();
        assert!(out.contains("Faturamento diário"));
        assert!(out.contains("stroke-dasharray"));
        assert!(out.contains(TREND));
        assert!(out.contains("01/02"));
    }

    #[test]
    fn one_shape_per_group() {
        let report = sample_report();
        let n = report.segments.len();
        // background, then one bar per segment
        assert_eq!(count(&segment_chart(&report.segments), "<rect"), n + 1);
        assert_eq!(count(&supervisor_chart(&report.supervisors), "<rect"), report.supervisors.len() + 1);
        let pie = coordinator_chart(&report.coordinators);
        assert_eq!(count(&pie, "<path"), report.coordinators.len());
        assert!(pie.to_string().contains("%)"));
    }

    #[test]
    fn single_slice_is_a_circle() {
        let groups = vec![Group {
            label: "Ana".to_string(),
            revenue: Amount(10_00),
        }];
        let pie = coordinator_chart(&groups);
        assert_eq!(count(&pie, "<circle"), 1);
        assert_eq!(count(&pie, "<path"), 0);
    }

    #[test]
    fn weekday_gaps() {
        let mut weekdays = Weekday::ALL.map(|weekday| WeekdayAverage {
            weekday,
            average: None,
        });
        assert_eq!(count(&weekday_chart(&weekdays), "<path"), 0);
        weekdays[2].average = Some(200.0);
        weekdays[3].average = Some(300.0);
        weekdays[5].average = Some(100.0);
        let out = weekday_chart(&weekdays).to_string();
        assert_eq!(out.matches("<circle").count(), 3);
        assert_eq!(out.matches("<path").count(), 1);
        assert!(out.contains("Domingo"));
    }

    #[test]
    fn files_written() {
        let dir = tempfile::tempdir().unwrap();
        let files = render(&sample_report(), &dir.path().join("charts")).unwrap();
        assert_eq!(files.len(), 5);
        for f in &files {
            let contents = std::fs::read_to_string(f).unwrap();
            assert!(contents.contains("<svg"));
        }
        assert!(dir.path().join("charts/weekday.svg").exists());
    }
}
