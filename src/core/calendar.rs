use chrono::{Datelike, Months, NaiveDate};

/// Maps projection months onto calendar dates. Month 0 is the current month,
/// pinned to a fixed day so every milestone lands on the same day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    start: NaiveDate,
}

impl Calendar {
    pub fn starting(today: NaiveDate, day: u32) -> Self {
        let start = today.with_day(day).unwrap_or(today);
        Self { start }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn date_at(&self, month: u32) -> Option<NaiveDate> {
        self.start.checked_add_months(Months::new(month))
    }

    /// Months from now until December of the final projection year.
    pub fn horizon_months(&self, years: u32, max_months: u32) -> u32 {
        let to_year_end = 12 - self.start.month();
        years
            .saturating_mul(12)
            .saturating_add(to_year_end)
            .min(max_months)
    }
}

/// Short month name and year, e.g. `Mar 2027`.
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}
