use chrono::{Local, NaiveDate};

/// Environment override used to pin "today" for scripted and test runs.
pub const TODAY_ENV_VAR: &str = "PAYPLAN_CORE_TODAY";

/// Source of the reference date used by the period generator.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation used by the interactive shell.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Deterministic clock for tests and scripted sessions.
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Builds the process clock, honoring `PAYPLAN_CORE_TODAY` when set.
pub fn from_env() -> Box<dyn Clock> {
    if let Ok(raw) = std::env::var(TODAY_ENV_VAR) {
        if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            return Box::new(FixedClock(date));
        }
        tracing::warn!("ignoring unparseable {} value `{}`", TODAY_ENV_VAR, raw);
    }
    Box::new(SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_pinned_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        assert_eq!(FixedClock(date).today(), date);
    }
}
