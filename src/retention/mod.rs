//! # Retention Date Resolution
//!
//! Data-removal dates for printable documents.
//!
//! Two horizons are computed from the issue date:
//!
//! - **Initial**: a short period in working days after which delivery and
//!   format detail is purged. Weekends and bank holidays are skipped.
//! - **Final**: the electoral-register rule. Documents issued January to June
//!   are removed 9 years after issue, July to December 10 years after issue.
//!
//! The resolver is pure. Holidays are passed in by the caller, normally from a
//! [`CachedBankHolidayCalendar`](holidays::CachedBankHolidayCalendar).

pub mod holidays;

use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::models::PrintableDocument;
pub use holidays::{BankHolidayCalendar, CachedBankHolidayCalendar, StaticBankHolidayCalendar};

/// How a retention period is counted from the issue date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum RetentionPeriod {
    /// Working days, skipping weekends and bank holidays
    WorkingDays(u32),
    CalendarDays(u32),
    /// 9 years when issued in the first half of the year, 10 in the second
    ElectoralRegisterCycle,
}

/// Resolve the removal date for `issue_date` under `period`
pub fn resolve_removal_date(
    issue_date: NaiveDate,
    period: RetentionPeriod,
    holidays: &HashSet<NaiveDate>,
) -> NaiveDate {
    match period {
        RetentionPeriod::WorkingDays(days) => add_working_days(issue_date, days, holidays),
        RetentionPeriod::CalendarDays(days) => issue_date
            .checked_add_days(chrono::Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX),
        RetentionPeriod::ElectoralRegisterCycle => {
            let years = if issue_date.month() <= 6 { 9 } else { 10 };
            issue_date
                .checked_add_months(Months::new(12 * years))
                .unwrap_or(NaiveDate::MAX)
        }
    }
}

pub fn is_working_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(&date)
}

fn add_working_days(start: NaiveDate, days: u32, holidays: &HashSet<NaiveDate>) -> NaiveDate {
    let mut date = start;
    let mut remaining = days;
    while remaining > 0 {
        match date.succ_opt() {
            Some(next) => date = next,
            None => return NaiveDate::MAX,
        }
        if is_working_day(date, holidays) {
            remaining -= 1;
        }
    }
    date
}

/// Both removal dates for one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionDates {
    pub initial_removal_date: NaiveDate,
    pub final_removal_date: NaiveDate,
}

impl RetentionDates {
    pub fn apply_to(&self, document: &mut PrintableDocument) {
        document.initial_retention_removal_date = Some(self.initial_removal_date);
        document.final_retention_removal_date = Some(self.final_removal_date);
    }
}

/// Resolves retention dates using a holiday calendar collaborator
///
/// ```rust
/// use chrono::NaiveDate;
/// use print_fulfillment::retention::{RetentionDateResolver, StaticBankHolidayCalendar};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let good_friday = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
/// let calendar = Arc::new(StaticBankHolidayCalendar::new([good_friday]));
/// let resolver = RetentionDateResolver::new(calendar, 1);
///
/// let dates = resolver
///     .resolve(NaiveDate::from_ymd_opt(2024, 3, 28).unwrap())
///     .await
///     .unwrap();
/// // Friday is a bank holiday and the weekend is skipped
/// assert_eq!(dates.initial_removal_date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
/// assert_eq!(dates.final_removal_date, NaiveDate::from_ymd_opt(2033, 3, 28).unwrap());
/// # });
/// ```
pub struct RetentionDateResolver {
    calendar: Arc<dyn BankHolidayCalendar>,
    initial_period: RetentionPeriod,
    final_period: RetentionPeriod,
}

impl RetentionDateResolver {
    pub fn new(calendar: Arc<dyn BankHolidayCalendar>, initial_working_days: u32) -> Self {
        Self {
            calendar,
            initial_period: RetentionPeriod::WorkingDays(initial_working_days),
            final_period: RetentionPeriod::ElectoralRegisterCycle,
        }
    }

    pub async fn resolve(&self, issue_date: NaiveDate) -> Result<RetentionDates> {
        let holidays = self.calendar.bank_holidays().await?;
        let dates = RetentionDates {
            initial_removal_date: resolve_removal_date(issue_date, self.initial_period, &holidays),
            final_removal_date: resolve_removal_date(issue_date, self.final_period, &holidays),
        };
        debug!(
            issue_date = %issue_date,
            initial_removal_date = %dates.initial_removal_date,
            final_removal_date = %dates.final_removal_date,
            "Resolved retention dates"
        );
        Ok(dates)
    }

    /// Compute and store both removal dates on the document
    pub async fn apply_to(&self, document: &mut PrintableDocument) -> Result<RetentionDates> {
        let dates = self.resolve(document.issue_date).await?;
        dates.apply_to(document);
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_second_half_issue_keeps_ten_years() {
        let removal = resolve_removal_date(
            date(2023, 10, 18),
            RetentionPeriod::ElectoralRegisterCycle,
            &HashSet::new(),
        );
        assert_eq!(removal, date(2033, 10, 18));
    }

    #[test]
    fn test_first_half_issue_keeps_nine_years() {
        let none = HashSet::new();
        assert_eq!(
            resolve_removal_date(date(2023, 6, 30), RetentionPeriod::ElectoralRegisterCycle, &none),
            date(2032, 6, 30)
        );
        assert_eq!(
            resolve_removal_date(date(2023, 7, 1), RetentionPeriod::ElectoralRegisterCycle, &none),
            date(2033, 7, 1)
        );
    }

    #[test]
    fn test_leap_day_clamps_to_end_of_february() {
        let removal = resolve_removal_date(
            date(2024, 2, 29),
            RetentionPeriod::ElectoralRegisterCycle,
            &HashSet::new(),
        );
        assert_eq!(removal, date(2033, 2, 28));
    }

    #[test]
    fn test_working_days_skip_weekends() {
        // Friday + 1 working day = Monday
        let removal = resolve_removal_date(
            date(2024, 5, 3),
            RetentionPeriod::WorkingDays(1),
            &HashSet::new(),
        );
        assert_eq!(removal, date(2024, 5, 6));
    }

    #[test]
    fn test_working_days_skip_bank_holidays() {
        // Friday 3 May 2024, Monday 6 May is the early May bank holiday
        let holidays: HashSet<_> = [date(2024, 5, 6)].into_iter().collect();
        let removal = resolve_removal_date(date(2024, 5, 3), RetentionPeriod::WorkingDays(1), &holidays);
        assert_eq!(removal, date(2024, 5, 7));

        let removal = resolve_removal_date(date(2024, 5, 3), RetentionPeriod::WorkingDays(5), &holidays);
        assert_eq!(removal, date(2024, 5, 13));
    }

    #[test]
    fn test_zero_working_days_is_issue_date() {
        let removal = resolve_removal_date(
            date(2024, 5, 4),
            RetentionPeriod::WorkingDays(0),
            &HashSet::new(),
        );
        assert_eq!(removal, date(2024, 5, 4));
    }

    #[test]
    fn test_calendar_days_ignore_holidays() {
        let holidays: HashSet<_> = [date(2024, 12, 25)].into_iter().collect();
        let removal = resolve_removal_date(date(2024, 12, 20), RetentionPeriod::CalendarDays(10), &holidays);
        assert_eq!(removal, date(2024, 12, 30));
    }

    #[tokio::test]
    async fn test_resolver_uses_calendar() {
        let calendar = Arc::new(StaticBankHolidayCalendar::new(vec![date(2024, 5, 6)]));
        let resolver = RetentionDateResolver::new(calendar, 1);

        let dates = resolver.resolve(date(2024, 5, 3)).await.unwrap();
        assert_eq!(dates.initial_removal_date, date(2024, 5, 7));
        assert_eq!(dates.final_removal_date, date(2033, 5, 3));
    }
}
