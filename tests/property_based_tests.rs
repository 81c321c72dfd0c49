//! Property-based tests for status history and retention date invariants.

mod common;

use std::collections::HashSet;

use chrono::{Datelike, Months};
use common::strategies::*;
use proptest::prelude::*;

use print_fulfillment::models::{PrintRequestStatusEntry, StatusHistory};
use print_fulfillment::retention::{is_working_day, resolve_removal_date, RetentionPeriod};

proptest! {
    #[test]
    fn appends_never_rewrite_earlier_entries(appends in appends_strategy()) {
        let mut history = StatusHistory::new();
        let mut expected = Vec::new();

        for (status, offset) in appends {
            let entry = PrintRequestStatusEntry::new(status, at(offset), None);
            history.append(entry.clone());
            expected.push(entry);
            prop_assert_eq!(history.entries(), expected.as_slice());
        }
    }

    #[test]
    fn current_status_is_latest_event_with_last_insert_winning_ties(appends in appends_strategy()) {
        let mut history = StatusHistory::new();
        for (status, offset) in &appends {
            history.append(PrintRequestStatusEntry::new(*status, at(*offset), None));
        }

        let latest = appends.iter().map(|(_, offset)| *offset).max().unwrap();
        let expected = appends
            .iter()
            .rev()
            .find(|(_, offset)| *offset == latest)
            .map(|(status, _)| *status);

        prop_assert_eq!(history.current_status(), expected);
        prop_assert_eq!(history.current().map(|entry| entry.event_date_time), Some(at(latest)));
    }

    #[test]
    fn initial_removal_date_is_a_later_working_day(
        issue_date in issue_date_strategy(),
        holidays in holidays_strategy(),
        days in 1u32..60,
    ) {
        let holidays: HashSet<_> = holidays.into_iter().collect();
        let removal = resolve_removal_date(issue_date, RetentionPeriod::WorkingDays(days), &holidays);

        prop_assert!(removal > issue_date);
        prop_assert!(is_working_day(removal, &holidays));

        let working_days_between = issue_date
            .iter_days()
            .skip(1)
            .take_while(|date| *date <= removal)
            .filter(|date| is_working_day(*date, &holidays))
            .count();
        prop_assert_eq!(working_days_between, days as usize);
    }

    #[test]
    fn final_removal_date_follows_register_cycle(issue_date in issue_date_strategy()) {
        let removal = resolve_removal_date(
            issue_date,
            RetentionPeriod::ElectoralRegisterCycle,
            &HashSet::new(),
        );
        let years = if issue_date.month() <= 6 { 9 } else { 10 };

        prop_assert_eq!(removal, issue_date + Months::new(12 * years));
    }
}
