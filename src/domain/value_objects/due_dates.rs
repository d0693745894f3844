use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use super::enums::goal_statuses::GoalStatus;

pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum NextDue {
    Due { date: NaiveDate },
    Ended,
    NotActive,
}

/// The day after the latest submission (or after the start day when nothing
/// has been submitted yet), unless that falls past the end day.
pub fn next_due_date(
    started_on: NaiveDate,
    ends_on: NaiveDate,
    latest_submission_day: Option<NaiveDate>,
) -> NextDue {
    let base = latest_submission_day.unwrap_or(started_on);
    match base.succ_opt() {
        Some(next) if next <= ends_on => NextDue::Due { date: next },
        _ => NextDue::Ended,
    }
}

/// Start and end days are read in the owner's calendar at start time, the
/// same calendar submission days are stored in.
pub fn next_due_for_goal(
    status: GoalStatus,
    started_at: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    utc_offset_minutes: i32,
    latest_submission_day: Option<NaiveDate>,
) -> NextDue {
    match (status, started_at, end_date) {
        (GoalStatus::Active, Some(started_at), Some(end_date)) => next_due_date(
            owner_day(started_at, utc_offset_minutes),
            owner_day(end_date, utc_offset_minutes),
            latest_submission_day,
        ),
        _ => NextDue::NotActive,
    }
}

fn owner_day(at: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    local_day(at, utc_offset_minutes).unwrap_or_else(|| at.date_naive())
}

/// Calendar day of `at` for a client `utc_offset_minutes` east of UTC.
/// Offsets outside +/-14h are rejected.
pub fn local_day(at: DateTime<Utc>, utc_offset_minutes: i32) -> Option<NaiveDate> {
    if utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return None;
    }
    let offset = FixedOffset::east_opt(utc_offset_minutes * 60)?;
    Some(at.with_timezone(&offset).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_due_day_follows_start() {
        assert_eq!(
            next_due_date(day(2024, 1, 1), day(2024, 1, 3), None),
            NextDue::Due {
                date: day(2024, 1, 2)
            }
        );
    }

    #[test]
    fn due_day_follows_latest_submission() {
        assert_eq!(
            next_due_date(day(2024, 1, 1), day(2024, 1, 3), Some(day(2024, 1, 2))),
            NextDue::Due {
                date: day(2024, 1, 3)
            }
        );
    }

    #[test]
    fn submission_on_last_day_ends_the_schedule() {
        assert_eq!(
            next_due_date(day(2024, 1, 1), day(2024, 1, 3), Some(day(2024, 1, 3))),
            NextDue::Ended
        );
    }

    #[test]
    fn goals_that_are_not_active_have_no_due_date() {
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let ends = Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap();
        assert_eq!(
            next_due_for_goal(GoalStatus::Assigned, None, None, 0, None),
            NextDue::NotActive
        );
        assert_eq!(
            next_due_for_goal(GoalStatus::Completed, Some(started), Some(ends), 0, None),
            NextDue::NotActive
        );
        assert_eq!(
            next_due_for_goal(GoalStatus::Active, Some(started), Some(ends), 0, None),
            NextDue::Due {
                date: day(2024, 1, 2)
            }
        );
    }

    #[test]
    fn due_day_rolls_over_year_end() {
        let (start, end) = (day(2023, 12, 31), day(2024, 1, 1));
        assert_eq!(
            next_due_date(start, end, None),
            NextDue::Due {
                date: day(2024, 1, 1)
            }
        );
        assert_eq!(next_due_date(start, end, Some(end)), NextDue::Ended);
    }

    #[test]
    fn due_day_rolls_over_month_end() {
        assert_eq!(
            next_due_date(day(2024, 1, 31), day(2024, 2, 7), None),
            NextDue::Due {
                date: day(2024, 2, 1)
            }
        );
        assert_eq!(
            next_due_date(day(2024, 4, 1), day(2024, 5, 1), Some(day(2024, 4, 30))),
            NextDue::Due {
                date: day(2024, 5, 1)
            }
        );
    }

    #[test]
    fn leap_day_is_a_due_day() {
        assert_eq!(
            next_due_date(day(2024, 2, 28), day(2024, 3, 6), None),
            NextDue::Due {
                date: day(2024, 2, 29)
            }
        );
        assert_eq!(
            next_due_date(day(2024, 2, 28), day(2024, 3, 6), Some(day(2024, 2, 29))),
            NextDue::Due {
                date: day(2024, 3, 1)
            }
        );
        assert_eq!(
            next_due_date(day(2023, 2, 28), day(2023, 3, 6), None),
            NextDue::Due {
                date: day(2023, 3, 1)
            }
        );
    }

    #[test]
    fn one_day_goal_has_a_single_due_day() {
        let (start, end) = (day(2024, 5, 10), day(2024, 5, 11));
        assert_eq!(
            next_due_date(start, end, Some(start)),
            NextDue::Due { date: end }
        );
        assert_eq!(next_due_date(start, end, Some(end)), NextDue::Ended);
    }

    #[test]
    fn submission_past_the_end_reports_ended() {
        assert_eq!(
            next_due_date(day(2024, 1, 1), day(2024, 1, 3), Some(day(2024, 1, 5))),
            NextDue::Ended
        );
        assert_eq!(
            next_due_date(day(2024, 1, 1), day(2024, 1, 1), None),
            NextDue::Ended
        );
    }

    #[test]
    fn schedule_uses_the_owner_calendar() {
        // 02:00Z is still the previous evening at UTC-5.
        let started = Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap();
        let ends = Utc.with_ymd_and_hms(2024, 3, 11, 2, 0, 0).unwrap();

        assert_eq!(
            next_due_for_goal(GoalStatus::Active, Some(started), Some(ends), -5 * 60, None),
            NextDue::Due {
                date: day(2024, 3, 10)
            }
        );
        assert_eq!(
            next_due_for_goal(
                GoalStatus::Active,
                Some(started),
                Some(ends),
                -5 * 60,
                Some(day(2024, 3, 10))
            ),
            NextDue::Ended
        );
        assert_eq!(
            next_due_for_goal(GoalStatus::Active, Some(started), Some(ends), 0, None),
            NextDue::Due {
                date: day(2024, 3, 11)
            }
        );
    }

    #[test]
    fn local_day_uses_client_offset() {
        let late_utc = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(local_day(late_utc, 0), Some(day(2024, 3, 10)));
        assert_eq!(local_day(late_utc, 7 * 60), Some(day(2024, 3, 11)));
        assert_eq!(
            local_day(Utc.with_ymd_and_hms(2024, 3, 10, 2, 0, 0).unwrap(), -5 * 60),
            Some(day(2024, 3, 9))
        );
        assert_eq!(local_day(late_utc, 15 * 60), None);
    }
}
