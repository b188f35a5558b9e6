//! Date windows for time-range queries.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Inclusive date range used by valuation and analytics queries.
///
/// Bounds are whole days; `start_instant()`/`end_instant()` expand them to
/// the first and last representable instant of the respective day, so an
/// event stamped anywhere inside the end day still falls in the window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

/// First instant of a day (00:00:00 UTC).
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last instant of a day (23:59:59.999999999 UTC).
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last))
}

impl DateWindow {
    /// Build a window, rejecting inverted bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation(
                "start date must be on or before end date",
            ));
        }
        Ok(Self { start, end })
    }

    /// The default reporting window: the 30 days ending today.
    pub fn last_30_days(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(30),
            end: today,
        }
    }

    /// Resolve optional bounds the way reporting callers expect: both
    /// missing means the default 30-day window, one missing clamps to the
    /// other bound.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DomainResult<Self> {
        match (start, end) {
            (None, None) => Ok(Self::last_30_days(Utc::now().date_naive())),
            (Some(s), None) => Self::new(s, Utc::now().date_naive()),
            (None, Some(e)) => Self::new(e - Duration::days(30), e),
            (Some(s), Some(e)) => Self::new(s, e),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// First instant of the start day.
    pub fn start_instant(&self) -> DateTime<Utc> {
        start_of_day(self.start)
    }

    /// Last instant of the end day.
    pub fn end_instant(&self) -> DateTime<Utc> {
        end_of_day(self.end)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_instant() && instant <= self.end_instant()
    }

    /// Iterate the days of the window in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let mut current = self.start;
        let end = self.end;
        std::iter::from_fn(move || {
            if current > end {
                return None;
            }
            let day = current;
            current += Duration::days(1);
            Some(day)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = DateWindow::new(d("2025-02-10"), d("2025-02-01")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn defaults_to_thirty_days() {
        let w = DateWindow::last_30_days(d("2025-03-31"));
        assert_eq!(w.start(), d("2025-03-01"));
        assert_eq!(w.end(), d("2025-03-31"));
    }

    #[test]
    fn end_day_is_inclusive() {
        let w = DateWindow::new(d("2025-01-01"), d("2025-01-02")).unwrap();
        let late = Utc.from_utc_datetime(&d("2025-01-02").and_hms_opt(23, 59, 59).unwrap());
        assert!(w.contains(late));
        let next = Utc.from_utc_datetime(&d("2025-01-03").and_hms_opt(0, 0, 0).unwrap());
        assert!(!w.contains(next));
    }

    #[test]
    fn iterates_days_ascending() {
        let w = DateWindow::new(d("2025-01-30"), d("2025-02-02")).unwrap();
        let days: Vec<_> = w.days().collect();
        assert_eq!(
            days,
            vec![d("2025-01-30"), d("2025-01-31"), d("2025-02-01"), d("2025-02-02")]
        );
    }
}
