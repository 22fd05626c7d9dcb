//! Usage window boundaries.
//!
//! Calendar windows are aligned to UTC midnight. Billing-cycle windows repeat
//! monthly on the subscription's start day and time of day, clamped to the
//! last day of shorter months.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use crate::accounts::{Company, Subscription};
use crate::metrics::metric_models::{MetricPeriod, MetricPeriodMonthReset};
use crate::rules::{Condition, ConditionType};

/// Start of the calendar window containing `now`. `None` for all-time.
pub fn current_calendar_period_start(
    period: MetricPeriod,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let today = start_of_day(now);
    match period {
        MetricPeriod::AllTime => None,
        MetricPeriod::CurrentDay => Some(today),
        MetricPeriod::CurrentWeek => {
            let days_since_sunday = i64::from(now.weekday().num_days_from_sunday());
            Some(today - Duration::days(days_since_sunday))
        }
        MetricPeriod::CurrentMonth => month_start(now.year(), now.month()),
    }
}

/// Start of the calendar window after the one containing `now`. `None` for all-time.
pub fn next_calendar_period_start(
    period: MetricPeriod,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let today = start_of_day(now);
    match period {
        MetricPeriod::AllTime => None,
        MetricPeriod::CurrentDay => Some(today + Duration::days(1)),
        MetricPeriod::CurrentWeek => {
            // on a Sunday the next window starts a full week later
            let days_until_sunday = match now.weekday().num_days_from_sunday() {
                0 => 7,
                n => 7 - i64::from(n),
            };
            Some(today + Duration::days(days_until_sunday))
        }
        MetricPeriod::CurrentMonth => {
            let (year, month) = shift_month(now.year(), now.month(), 1);
            month_start(year, month)
        }
    }
}

/// Start of the billing month containing `now`, falling back to the calendar
/// month when there is no subscription or it has not started yet.
pub fn current_billing_period_start(
    subscription: Option<&Subscription>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let period_start = match subscription {
        Some(subscription) if subscription.period_start <= now => subscription.period_start,
        _ => return current_calendar_period_start(MetricPeriod::CurrentMonth, now),
    };

    let mut anchor = anchor_in_month(now.year(), now.month(), period_start)?;
    if anchor > now {
        let (year, month) = shift_month(now.year(), now.month(), -1);
        anchor = anchor_in_month(year, month, period_start)?;
    }

    Some(anchor.max(period_start))
}

/// Next billing-month boundary after `now`. Never later than the end of the
/// subscription's current period.
pub fn next_billing_period_start(
    subscription: Option<&Subscription>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let Some(subscription) = subscription else {
        return next_calendar_period_start(MetricPeriod::CurrentMonth, now);
    };
    let period_start = subscription.period_start;

    if period_start > now {
        let next_month = next_calendar_period_start(MetricPeriod::CurrentMonth, now)?;
        return Some(period_start.min(next_month));
    }

    let mut anchor = anchor_in_month(now.year(), now.month(), period_start)?;
    if anchor <= now {
        let (year, month) = shift_month(now.year(), now.month(), 1);
        anchor = anchor_in_month(year, month, period_start)?;
    }

    Some(anchor.min(subscription.period_end))
}

/// When the counter behind a metric condition next resets. `None` for
/// non-metric conditions and all-time metrics.
pub fn next_metric_period_start_from_condition(
    condition: &Condition,
    company: Option<&Company>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match metric_window(condition)? {
        Window::Billing => {
            next_billing_period_start(company.and_then(|c| c.subscription.as_ref()), now)
        }
        Window::Calendar(period) => next_calendar_period_start(period, now),
    }
}

/// When the counter behind a metric condition last reset.
pub fn current_metric_period_start_from_condition(
    condition: &Condition,
    company: Option<&Company>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match metric_window(condition)? {
        Window::Billing => {
            current_billing_period_start(company.and_then(|c| c.subscription.as_ref()), now)
        }
        Window::Calendar(period) => current_calendar_period_start(period, now),
    }
}

enum Window {
    Billing,
    Calendar(MetricPeriod),
}

fn metric_window(condition: &Condition) -> Option<Window> {
    if condition.condition_type != ConditionType::Metric {
        return None;
    }

    match (condition.metric_period?, condition.metric_period_month_reset) {
        (MetricPeriod::CurrentMonth, Some(MetricPeriodMonthReset::BillingCycle)) => {
            Some(Window::Billing)
        }
        (period, _) => Some(Window::Calendar(period)),
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Moves `(year, month)` by `delta` months, carrying into the year.
fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 + delta;
    (zero_based.div_euclid(12), zero_based.rem_euclid(12) as u32 + 1)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = shift_month(year, month, 1);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|last| last.day())
}

/// The instant in `year`/`month` with the same day and time of day as `anchor`.
fn anchor_in_month(year: i32, month: u32, anchor: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let day = anchor.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.and_time(anchor.time()).and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;
    use crate::utils::test_utils::{create_test_company, create_test_condition};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn subscription(start: DateTime<Utc>, end: DateTime<Utc>) -> Subscription {
        Subscription {
            id: "sub_1".to_string(),
            period_start: start,
            period_end: end,
        }
    }

    #[rstest]
    // Wednesday
    #[case(MetricPeriod::CurrentDay, at(2024, 5, 15, 13, 4, 5), Some(at(2024, 5, 15, 0, 0, 0)))]
    #[case(MetricPeriod::CurrentWeek, at(2024, 5, 15, 13, 4, 5), Some(at(2024, 5, 12, 0, 0, 0)))]
    // Sunday is its own week start
    #[case(MetricPeriod::CurrentWeek, at(2024, 5, 12, 9, 0, 0), Some(at(2024, 5, 12, 0, 0, 0)))]
    #[case(MetricPeriod::CurrentMonth, at(2024, 5, 15, 13, 4, 5), Some(at(2024, 5, 1, 0, 0, 0)))]
    #[case(MetricPeriod::AllTime, at(2024, 5, 15, 13, 4, 5), None)]
    fn test_current_calendar_period_start(
        #[case] period: MetricPeriod,
        #[case] now: DateTime<Utc>,
        #[case] expected: Option<DateTime<Utc>>,
    ) {
        assert_eq!(current_calendar_period_start(period, now), expected);
    }

    #[rstest]
    #[case(MetricPeriod::CurrentDay, at(2024, 5, 15, 13, 4, 5), Some(at(2024, 5, 16, 0, 0, 0)))]
    #[case(MetricPeriod::CurrentDay, at(2024, 12, 31, 23, 59, 59), Some(at(2025, 1, 1, 0, 0, 0)))]
    #[case(MetricPeriod::CurrentWeek, at(2024, 5, 15, 13, 4, 5), Some(at(2024, 5, 19, 0, 0, 0)))]
    #[case(MetricPeriod::CurrentWeek, at(2024, 5, 18, 23, 0, 0), Some(at(2024, 5, 19, 0, 0, 0)))]
    #[case(MetricPeriod::CurrentWeek, at(2024, 5, 19, 0, 0, 0), Some(at(2024, 5, 26, 0, 0, 0)))]
    #[case(MetricPeriod::CurrentMonth, at(2024, 5, 15, 13, 4, 5), Some(at(2024, 6, 1, 0, 0, 0)))]
    #[case(MetricPeriod::CurrentMonth, at(2024, 12, 10, 0, 0, 0), Some(at(2025, 1, 1, 0, 0, 0)))]
    #[case(MetricPeriod::AllTime, at(2024, 5, 15, 13, 4, 5), None)]
    fn test_next_calendar_period_start(
        #[case] period: MetricPeriod,
        #[case] now: DateTime<Utc>,
        #[case] expected: Option<DateTime<Utc>>,
    ) {
        assert_eq!(next_calendar_period_start(period, now), expected);
    }

    #[test]
    fn test_next_month_is_never_the_current_month() {
        let mut now = at(2023, 1, 1, 0, 0, 0);
        let end = at(2025, 1, 1, 0, 0, 0);
        while now < end {
            let next = next_calendar_period_start(MetricPeriod::CurrentMonth, now).unwrap();
            assert!(next > now);
            assert_ne!((next.year(), next.month()), (now.year(), now.month()));
            now += Duration::hours(37);
        }
    }

    #[test]
    fn test_billing_falls_back_to_calendar_month() {
        let now = at(2024, 5, 15, 13, 0, 0);

        assert_eq!(
            current_billing_period_start(None, now),
            Some(at(2024, 5, 1, 0, 0, 0))
        );
        assert_eq!(
            next_billing_period_start(None, now),
            Some(at(2024, 6, 1, 0, 0, 0))
        );

        let future = subscription(at(2024, 7, 3, 0, 0, 0), at(2024, 8, 3, 0, 0, 0));
        assert_eq!(
            current_billing_period_start(Some(&future), now),
            Some(at(2024, 5, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_future_subscription_next_start_is_the_earlier_boundary() {
        let now = at(2024, 5, 15, 13, 0, 0);

        let soon = subscription(at(2024, 5, 20, 0, 0, 0), at(2024, 6, 20, 0, 0, 0));
        assert_eq!(
            next_billing_period_start(Some(&soon), now),
            Some(at(2024, 5, 20, 0, 0, 0))
        );

        let later = subscription(at(2024, 7, 3, 0, 0, 0), at(2024, 8, 3, 0, 0, 0));
        assert_eq!(
            next_billing_period_start(Some(&later), now),
            Some(at(2024, 6, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_billing_anchor_this_month_and_last() {
        let sub = subscription(at(2024, 1, 10, 8, 30, 0), at(2025, 1, 10, 8, 30, 0));

        // anchor already passed this month
        let now = at(2024, 5, 15, 0, 0, 0);
        assert_eq!(
            current_billing_period_start(Some(&sub), now),
            Some(at(2024, 5, 10, 8, 30, 0))
        );
        assert_eq!(
            next_billing_period_start(Some(&sub), now),
            Some(at(2024, 6, 10, 8, 30, 0))
        );

        // anchor still ahead this month
        let now = at(2024, 5, 10, 8, 0, 0);
        assert_eq!(
            current_billing_period_start(Some(&sub), now),
            Some(at(2024, 4, 10, 8, 30, 0))
        );
        assert_eq!(
            next_billing_period_start(Some(&sub), now),
            Some(at(2024, 5, 10, 8, 30, 0))
        );

        // exactly on the anchor counts as passed
        let now = at(2024, 5, 10, 8, 30, 0);
        assert_eq!(
            current_billing_period_start(Some(&sub), now),
            Some(at(2024, 5, 10, 8, 30, 0))
        );
        assert_eq!(
            next_billing_period_start(Some(&sub), now),
            Some(at(2024, 6, 10, 8, 30, 0))
        );
    }

    #[test]
    fn test_billing_anchor_across_year_boundary() {
        let sub = subscription(at(2023, 3, 20, 0, 0, 0), at(2025, 3, 20, 0, 0, 0));

        let now = at(2024, 12, 25, 0, 0, 0);
        assert_eq!(
            next_billing_period_start(Some(&sub), now),
            Some(at(2025, 1, 20, 0, 0, 0))
        );

        let now = at(2024, 1, 5, 0, 0, 0);
        assert_eq!(
            current_billing_period_start(Some(&sub), now),
            Some(at(2023, 12, 20, 0, 0, 0))
        );
    }

    #[test]
    fn test_billing_current_start_clamped_to_subscription_start() {
        let sub = subscription(at(2024, 5, 10, 12, 0, 0), at(2024, 6, 10, 12, 0, 0));
        let now = at(2024, 5, 10, 18, 0, 0);

        assert_eq!(
            current_billing_period_start(Some(&sub), now),
            Some(at(2024, 5, 10, 12, 0, 0))
        );
    }

    #[test]
    fn test_billing_next_start_clamped_to_period_end() {
        let sub = subscription(at(2024, 1, 10, 0, 0, 0), at(2024, 5, 25, 0, 0, 0));
        let now = at(2024, 5, 15, 0, 0, 0);

        assert_eq!(
            next_billing_period_start(Some(&sub), now),
            Some(at(2024, 5, 25, 0, 0, 0))
        );
    }

    #[test]
    fn test_billing_anchor_clamped_to_short_months() {
        let sub = subscription(at(2024, 1, 31, 0, 0, 0), at(2025, 1, 31, 0, 0, 0));

        let now = at(2024, 2, 15, 0, 0, 0);
        assert_eq!(
            next_billing_period_start(Some(&sub), now),
            Some(at(2024, 2, 29, 0, 0, 0))
        );

        let now = at(2024, 3, 15, 0, 0, 0);
        assert_eq!(
            current_billing_period_start(Some(&sub), now),
            Some(at(2024, 2, 29, 0, 0, 0))
        );
        assert_eq!(
            next_billing_period_start(Some(&sub), now),
            Some(at(2024, 3, 31, 0, 0, 0))
        );

        let now = at(2023, 4, 2, 0, 0, 0);
        let sub = subscription(at(2023, 1, 31, 0, 0, 0), at(2024, 1, 31, 0, 0, 0));
        assert_eq!(
            current_billing_period_start(Some(&sub), now),
            Some(at(2023, 3, 31, 0, 0, 0))
        );
        assert_eq!(
            next_billing_period_start(Some(&sub), now),
            Some(at(2023, 4, 30, 0, 0, 0))
        );
    }

    #[test]
    fn test_next_billing_never_exceeds_period_end() {
        let sub = subscription(at(2024, 1, 31, 6, 0, 0), at(2024, 3, 1, 0, 0, 0));
        let mut now = at(2024, 1, 31, 6, 0, 0);
        while now < sub.period_end {
            let next = next_billing_period_start(Some(&sub), now).unwrap();
            assert!(next <= sub.period_end);
            now += Duration::hours(5);
        }
    }

    #[test]
    fn test_condition_windows() {
        let mut company = create_test_company();
        company.subscription = Some(subscription(
            at(2024, 1, 10, 0, 0, 0),
            at(2025, 1, 10, 0, 0, 0),
        ));
        let now = at(2024, 5, 15, 0, 0, 0);

        let mut condition = create_test_condition(ConditionType::Metric);
        condition.event_subtype = Some("api-call".to_string());
        condition.metric_period = Some(MetricPeriod::CurrentMonth);
        assert_eq!(
            next_metric_period_start_from_condition(&condition, Some(&company), now),
            Some(at(2024, 6, 1, 0, 0, 0))
        );
        assert_eq!(
            current_metric_period_start_from_condition(&condition, Some(&company), now),
            Some(at(2024, 5, 1, 0, 0, 0))
        );

        condition.metric_period_month_reset = Some(MetricPeriodMonthReset::BillingCycle);
        assert_eq!(
            next_metric_period_start_from_condition(&condition, Some(&company), now),
            Some(at(2024, 6, 10, 0, 0, 0))
        );
        assert_eq!(
            current_metric_period_start_from_condition(&condition, Some(&company), now),
            Some(at(2024, 5, 10, 0, 0, 0))
        );
        // billing reset without a company uses the calendar month
        assert_eq!(
            next_metric_period_start_from_condition(&condition, None, now),
            Some(at(2024, 6, 1, 0, 0, 0))
        );

        // billing reset only applies to monthly windows
        condition.metric_period = Some(MetricPeriod::CurrentDay);
        assert_eq!(
            next_metric_period_start_from_condition(&condition, Some(&company), now),
            Some(at(2024, 5, 16, 0, 0, 0))
        );

        condition.metric_period = None;
        assert_eq!(
            next_metric_period_start_from_condition(&condition, Some(&company), now),
            None
        );

        let trait_condition = create_test_condition(ConditionType::Trait);
        assert_eq!(
            next_metric_period_start_from_condition(&trait_condition, Some(&company), now),
            None
        );
    }

    #[rstest]
    #[case(2024, 12, 1, (2025, 1))]
    #[case(2024, 1, -1, (2023, 12))]
    #[case(2024, 6, -18, (2022, 12))]
    #[case(2024, 6, 0, (2024, 6))]
    fn test_shift_month(
        #[case] year: i32,
        #[case] month: u32,
        #[case] delta: i32,
        #[case] expected: (i32, u32),
    ) {
        assert_eq!(shift_month(year, month, delta), expected);
    }
}
