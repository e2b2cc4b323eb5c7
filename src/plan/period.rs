use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Pay periods anchor on Fridays, matching the household's payday.
pub const ANCHOR_WEEKDAY: Weekday = Weekday::Fri;

/// Upper bound on the generated sequence length; the persistence layer
/// provisions this many period slots.
pub const MAX_PERIODS: u32 = 56;

/// Ordinal, 1-based period identifier. Allocations reference periods by this
/// id, never by date, so the id to date mapping must stay stable across
/// regenerations (see [`generate_periods`]).
pub type PeriodId = u32;

/// One pay cycle: an anchor date (payday) plus the income landing on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayPeriod {
    pub id: PeriodId,
    pub anchor_date: NaiveDate,
    pub income: f64,
}

/// The two alternating paycheck amounts (X on even indices, Y on odd).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeSettings {
    pub amount_x: f64,
    pub amount_y: f64,
}

impl Default for IncomeSettings {
    fn default() -> Self {
        Self {
            amount_x: 2500.0,
            amount_y: 1800.0,
        }
    }
}

/// Generator inputs: the earliest permitted anchor, how many periods to
/// generate before "today", and the total sequence length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleSettings {
    pub floor_date: NaiveDate,
    pub lookback_periods: u32,
    pub total_periods: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            floor_date: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            lookback_periods: 4,
            total_periods: 12,
        }
    }
}

/// Builds the full ordered period sequence.
///
/// Starting point: the most recent anchor weekday on/before `today`, stepped
/// back `lookback_periods` weeks, snapped forward to the first anchor weekday
/// on/after the floor when it lands below it. Incomes alternate X, Y, X, Y
/// starting with X. Callers replacing an existing sequence must re-home
/// allocations by ordinal id afterwards; the id to date mapping only stays
/// stable when the settings do.
pub fn generate_periods(
    today: NaiveDate,
    income: &IncomeSettings,
    settings: &ScheduleSettings,
) -> Vec<PayPeriod> {
    let recent = anchor_on_or_before(today);
    let mut start = recent - Duration::weeks(settings.lookback_periods as i64);
    if start < settings.floor_date {
        start = anchor_on_or_after(settings.floor_date);
    }

    let total = settings.total_periods.clamp(1, MAX_PERIODS);
    (0..total)
        .map(|index| PayPeriod {
            id: index + 1,
            anchor_date: start + Duration::weeks(index as i64),
            income: if index % 2 == 0 {
                income.amount_x
            } else {
                income.amount_y
            },
        })
        .collect()
}

fn anchor_on_or_before(date: NaiveDate) -> NaiveDate {
    let target = ANCHOR_WEEKDAY.num_days_from_monday();
    let current = date.weekday().num_days_from_monday();
    let back = (current + 7 - target) % 7;
    date - Duration::days(back as i64)
}

fn anchor_on_or_after(date: NaiveDate) -> NaiveDate {
    let target = ANCHOR_WEEKDAY.num_days_from_monday();
    let current = date.weekday().num_days_from_monday();
    let forward = (target + 7 - current) % 7;
    date + Duration::days(forward as i64)
}
