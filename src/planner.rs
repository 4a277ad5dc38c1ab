use crate::error::{GatewayError, GatewayResult};
use crate::upstream::IntervalType;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Buckets requested per day-scope window (upstream "records").
pub const DAY_RECORDS: u32 = 24;
/// Buckets requested for a month-scope window, whatever the month length.
pub const MONTH_RECORDS: u32 = 31;
/// Fixed step between month-scope windows.
pub const MONTH_DELTA_DAYS: u32 = 30;

pub const DAY_GRANULARITIES: [u32; 3] = [15, 30, 60];
pub const MONTH_GRANULARITIES: [u32; 1] = [1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Day,
    Month,
}

impl Scope {
    /// Parses the `datarange` URL code (`d` or `m`).
    pub fn from_code(code: &str) -> GatewayResult<Self> {
        match code {
            "d" => Ok(Scope::Day),
            "m" => Ok(Scope::Month),
            other => Err(GatewayError::invalid(
                "datarange",
                format!("expected `d` or `m`, got `{}`", other),
            )),
        }
    }

    pub fn supported_granularities(self) -> &'static [u32] {
        match self {
            Scope::Day => &DAY_GRANULARITIES,
            Scope::Month => &MONTH_GRANULARITIES,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Day => write!(f, "day"),
            Scope::Month => write!(f, "month"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketUnit {
    Minute,
    Day,
}

impl BucketUnit {
    pub fn interval_type(self) -> IntervalType {
        match self {
            BucketUnit::Minute => IntervalType::Minutes,
            BucketUnit::Day => IntervalType::Days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: NaiveDateTime,
    pub unit: BucketUnit,
    pub bucket_count: u32,
    pub step: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWindow {
    pub label: String,
    pub window: QueryWindow,
}

/// Computes the ordered upstream windows covering `date`'s day or month.
pub fn plan(scope: Scope, date: NaiveDate, granularity: u32) -> GatewayResult<Vec<PlannedWindow>> {
    if !scope.supported_granularities().contains(&granularity) {
        return Err(GatewayError::invalid(
            "interval",
            format!(
                "{} is not supported for {} scope (expected one of {:?})",
                granularity,
                scope,
                scope.supported_granularities()
            ),
        ));
    }

    match scope {
        Scope::Day => Ok(plan_day(date, granularity)),
        Scope::Month => plan_month(date, granularity),
    }
}

fn plan_day(date: NaiveDate, granularity: u32) -> Vec<PlannedWindow> {
    let midnight = date.and_time(NaiveTime::MIN);
    let windows = 60 / granularity;
    let delta_hours = DAY_RECORDS / windows;

    (0..windows)
        .map(|i| {
            let start_hour = i * delta_hours;
            PlannedWindow {
                label: format!("time_{}_{}", start_hour, start_hour + delta_hours),
                window: QueryWindow {
                    start: midnight + Duration::hours(i64::from(start_hour)),
                    unit: BucketUnit::Minute,
                    bucket_count: DAY_RECORDS,
                    step: granularity,
                },
            }
        })
        .collect()
}

fn plan_month(date: NaiveDate, granularity: u32) -> GatewayResult<Vec<PlannedWindow>> {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .ok_or_else(|| GatewayError::invalid("date", format!("no first day for {}", date)))?;
    let start = first.and_time(NaiveTime::MIN);
    let windows = 1 / granularity;

    Ok((0..windows)
        .map(|i| {
            let offset_days = i * MONTH_DELTA_DAYS;
            let start_day = first.day() + offset_days;
            PlannedWindow {
                label: format!("day_{}_{}", start_day, start_day + MONTH_DELTA_DAYS),
                window: QueryWindow {
                    start: start + Duration::days(i64::from(offset_days)),
                    unit: BucketUnit::Day,
                    bucket_count: MONTH_RECORDS,
                    step: granularity,
                },
            }
        })
        .collect())
}

/// Exact number of days in `date`'s month.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}
