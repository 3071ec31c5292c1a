use std::fmt;
use std::iter::Sum;
use std::ops;

use crate::lib::date::Date;

/// Monetary value, in cents
///
/// Sums of amounts are exact, so that a total and the sum of its
/// breakdown agree to the cent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Round a spreadsheet value to the nearest cent
    pub fn from_f64(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn nonzero(self) -> bool {
        self.0 != 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl ops::Add for Amount {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl ops::AddAssign for Amount {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// `R$ 1.234.567,89`
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        let units = (cents / 100).to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, c) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "R$ {}{},{:02}", sign, grouped, cents % 100)
    }
}

/// One complete row of the billing calendar
#[derive(Debug, Clone, PartialEq)]
pub struct BillingRecord {
    pub date: Date,
    pub revenue: Amount,
    pub segment: String,
    pub coordinator: String,
    pub supervisor: String,
    /// month of the year, `"1"` to `"12"`
    pub month: String,
}

impl BillingRecord {
    pub fn new<S>(date: Date, revenue: Amount, segment: S, coordinator: S, supervisor: S) -> Self
    where
        S: ToString,
    {
        use chrono::Datelike;
        Self {
            date,
            revenue,
            segment: segment.to_string(),
            coordinator: coordinator.to_string(),
            supervisor: supervisor.to_string(),
            month: date.month().to_string(),
        }
    }
}

/// Deductions ("glosas") of a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeductionRecord {
    pub date: Date,
    pub amount: Amount,
}

/// Filter on a category label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// no narrowing
    All,
    /// exact, case-sensitive label
    Exactly(String),
}

impl Selection {
    /// Label offered in the choice lists for `All`
    pub const ALL_LABEL: &'static str = "Todos";

    /// `"Todos"` and `"All"` in any case select everything
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case(Self::ALL_LABEL) || label.eq_ignore_ascii_case("all") {
            Selection::All
        } else {
            Selection::Exactly(label.to_string())
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Exactly(wanted) => wanted == label,
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::All
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "{}", Self::ALL_LABEL),
            Selection::Exactly(label) => write!(f, "{}", label),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn amount_fmt() {
        assert_eq!(Amount(0).to_string(), "R$ 0,00");
        assert_eq!(Amount(5).to_string(), "R$ 0,05");
        assert_eq!(Amount(123456).to_string(), "R$ 1.234,56");
        assert_eq!(Amount(123456789).to_string(), "R$ 1.234.567,89");
        assert_eq!(Amount(100000).to_string(), "R$ 1.000,00");
        assert_eq!(Amount(99999).to_string(), "R$ 999,99");
        assert_eq!(Amount(-123456).to_string(), "R$ -1.234,56");
    }

    #[test]
    fn amount_rounding() {
        assert_eq!(Amount::from_f64(1234.5), Amount(123450));
        assert_eq!(Amount::from_f64(0.1 + 0.2), Amount(30));
        assert_eq!(Amount::from_f64(-1.239), Amount(-124));
        assert_eq!(Amount(12345).to_f64(), 123.45);
        let total: Amount = [Amount(1), Amount(2), Amount(3)].iter().sum();
        assert_eq!(total, Amount(6));
    }

    #[test]
    fn selection_sentinel() {
        assert_eq!(Selection::parse("Todos"), Selection::All);
        assert_eq!(Selection::parse("todos"), Selection::All);
        assert_eq!(Selection::parse("All"), Selection::All);
        assert_eq!(Selection::parse(" ALL "), Selection::All);
        assert_eq!(
            Selection::parse("Varejo"),
            Selection::Exactly("Varejo".to_string())
        );
        assert!(Selection::All.matches("anything"));
        assert!(Selection::parse("Varejo").matches("Varejo"));
        assert!(!Selection::parse("Varejo").matches("varejo"));
        assert_eq!(Selection::All.to_string(), "Todos");
    }

    #[test]
    fn month_label() {
        let date = Date::from_ymd_opt(2024, 11, 3).unwrap();
        let rec = BillingRecord::new(date, Amount(100), "A", "B", "C");
        assert_eq!(rec.month, "11");
    }
}
