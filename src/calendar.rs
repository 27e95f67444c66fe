use chrono::{
    Datelike, Duration as ChronoDuration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone,
};
use itertools::Itertools;

use crate::{constants::WINDOW_SETTINGS, domain::Habit};

pub fn local_midnight(ts: i64) -> Option<i64> {
    let dt = Local.timestamp_opt(ts, 0).single()?;
    day_start(dt.date_naive())
}

pub fn day_start(date: NaiveDate) -> Option<i64> {
    let midnight = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Some(dt.timestamp()),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.timestamp()),
        LocalResult::None => Local
            .from_local_datetime(&(midnight + ChronoDuration::hours(1)))
            .earliest()
            .map(|dt| dt.timestamp()),
    }
}

pub fn same_calendar_day(a: i64, b: i64) -> bool {
    match (local_midnight(a), local_midnight(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalendarDay {
    pub date: i64,
    pub day_of_month: u32,
    pub is_today: bool,
    pub is_past: bool,
    pub is_completed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalendarWindow {
    pub start: i64,
    pub end: i64,
    pub total_days: i64,
    pub total_weeks: usize,
    pub weeks: Vec<Vec<CalendarDay>>,
}

pub fn calendar_window(
    habit: &Habit,
    is_expanded: bool,
    extra_weeks: i32,
    now: i64,
) -> Option<CalendarWindow> {
    let today = Local.timestamp_opt(now, 0).single()?.date_naive();
    let today_ts = day_start(today)?;

    let look_back = WINDOW_SETTINGS.past_days
        + if is_expanded {
            extra_weeks.max(0) as i64 * 7
        } else {
            0
        };
    let start_date = today - ChronoDuration::days(look_back);
    let end_date = today + ChronoDuration::days(WINDOW_SETTINGS.future_days);

    let start = day_start(start_date)?;
    let end = day_start(end_date)?;

    let total_days = (end_date - start_date).num_days() + 1;
    let total_weeks = ((total_days + 6) / 7) as usize;

    let days = (0..total_weeks as i64 * 7)
        .map(|offset| {
            let date = start_date + ChronoDuration::days(offset);
            let ts = day_start(date)?;
            Some(CalendarDay {
                date: ts,
                day_of_month: date.day(),
                is_today: ts == today_ts,
                is_past: ts < today_ts,
                is_completed: habit.is_completed(ts),
            })
        })
        .collect::<Option<Vec<_>>>()?;

    let grouped = days.into_iter().chunks(7);
    let weeks: Vec<Vec<CalendarDay>> = grouped
        .into_iter()
        .map(|week| week.collect())
        .collect();

    Some(CalendarWindow {
        start,
        end,
        total_days,
        total_weeks,
        weeks,
    })
}
