use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::template::BillTemplate;

/// One dated occurrence of a bill template for a single calendar month.
///
/// The `template_*` fields preserve the lineage back to the originating
/// template/month occurrence so split fragments can be merged back together
/// and monthly status can count distinct lineages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillInstance {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub template_id: Uuid,
    pub template_name: String,
    pub template_due_date: NaiveDate,
}

/// Uniqueness contract for idempotent expansion: the id of a generated
/// occurrence is a pure function of `(template_id, year, month)`, so
/// re-running the expander can never mint a second instance for the same
/// template and month. Split fragments get fresh v4 ids instead, since they
/// no longer map 1:1 to a template/month pair.
pub fn occurrence_id(template_id: Uuid, year: i32, month: u32) -> Uuid {
    Uuid::new_v5(&template_id, format!("{year:04}-{month:02}").as_bytes())
}

impl BillInstance {
    /// Materializes a template for one calendar month. Due days past the end
    /// of a short month land on its last day.
    pub fn occurrence(template: &BillTemplate, year: i32, month: u32) -> Self {
        let due_date = due_date_for(template.due_day, year, month);
        Self {
            id: occurrence_id(template.id, year, month),
            name: template.name.clone(),
            amount: template.amount,
            due_date,
            template_id: template.id,
            template_name: template.name.clone(),
            template_due_date: due_date,
        }
    }
}

pub(crate) fn due_date_for(due_day: u32, year: i32, month: u32) -> NaiveDate {
    let day = due_day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 1).unwrap())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    let last_current = first_next - Duration::days(1);
    last_current.day()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_ids_are_deterministic() {
        let template = BillTemplate::new("Electric", 150.0, 20).unwrap();
        let first = occurrence_id(template.id, 2026, 3);
        let second = occurrence_id(template.id, 2026, 3);
        assert_eq!(first, second);
        assert_ne!(first, occurrence_id(template.id, 2026, 4));
    }

    #[test]
    fn occurrence_carries_template_lineage() {
        let template = BillTemplate::new("Electric", 150.0, 20).unwrap();
        let instance = BillInstance::occurrence(&template, 2026, 3);
        assert_eq!(instance.id, occurrence_id(template.id, 2026, 3));
        assert_eq!(instance.template_id, template.id);
        assert_eq!(
            instance.due_date,
            NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()
        );
        assert_eq!(instance.due_date, instance.template_due_date);
    }

    #[test]
    fn due_day_clamps_to_short_months() {
        assert_eq!(
            due_date_for(31, 2026, 2),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
        assert_eq!(
            due_date_for(31, 2028, 2),
            NaiveDate::from_ymd_opt(2028, 2, 29).unwrap()
        );
    }
}
