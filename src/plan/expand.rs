use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use super::allocation::AllocationTable;
use super::instance::{occurrence_id, BillInstance};
use super::period::PayPeriod;
use super::template::BillTemplate;

/// Expands active templates into dated instances for every calendar month
/// spanned by the period sequence, then prunes the unassigned pool of
/// instances whose template is no longer active.
///
/// Expansion is idempotent: an occurrence id already present anywhere in the
/// table (unassigned or assigned) is never recreated or mutated, so running
/// this twice over an unchanged catalog adds nothing. Assigned instances of
/// deactivated templates are left in place; only the user removes those.
pub fn expand_instances(
    templates: &[BillTemplate],
    periods: &[PayPeriod],
    table: &AllocationTable,
    floor_date: NaiveDate,
) -> AllocationTable {
    let mut next = table.clone();

    if let (Some(first), Some(last)) = (periods.first(), periods.last()) {
        for (year, month) in months_spanned(first.anchor_date, last.anchor_date) {
            if month_index(year, month) < month_index(floor_date.year(), floor_date.month()) {
                continue;
            }
            for template in templates.iter().filter(|template| template.active) {
                let id = occurrence_id(template.id, year, month);
                if next.contains(id) {
                    continue;
                }
                next.unassigned
                    .push(BillInstance::occurrence(template, year, month));
            }
        }
    }

    let active: HashSet<Uuid> = templates
        .iter()
        .filter(|template| template.active)
        .map(|template| template.id)
        .collect();
    next.retain_unassigned(|bill| active.contains(&bill.template_id));
    next
}

/// Calendar months touched by the inclusive date range, in order.
fn months_spanned(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let mut cursor = month_index(start.year(), start.month());
    let last = month_index(end.year(), end.month());
    while cursor <= last {
        months.push((cursor.div_euclid(12), cursor.rem_euclid(12) as u32 + 1));
        cursor += 1;
    }
    months
}

fn month_index(year: i32, month: u32) -> i32 {
    year * 12 + month as i32 - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::period::{generate_periods, IncomeSettings, ScheduleSettings};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn winter_periods() -> Vec<PayPeriod> {
        generate_periods(
            date(2026, 1, 7),
            &IncomeSettings::default(),
            &ScheduleSettings::default(),
        )
    }

    #[test]
    fn expands_one_instance_per_template_per_month() {
        let templates = vec![
            BillTemplate::new("Electric", 150.0, 20).unwrap(),
            BillTemplate::new("Water", 80.0, 25).unwrap(),
        ];
        let floor = ScheduleSettings::default().floor_date;
        let table = expand_instances(
            &templates,
            &winter_periods(),
            &AllocationTable::default(),
            floor,
        );
        // Periods span 2025-12-19 through 2026-03-06: Dec, Jan, Feb, Mar.
        assert_eq!(table.unassigned.len(), 8);
        assert!(table
            .unassigned
            .iter()
            .any(|bill| bill.due_date == date(2026, 3, 20)));
    }

    #[test]
    fn expansion_is_idempotent() {
        let templates = vec![BillTemplate::new("Electric", 150.0, 20).unwrap()];
        let floor = ScheduleSettings::default().floor_date;
        let periods = winter_periods();
        let once = expand_instances(&templates, &periods, &AllocationTable::default(), floor);
        let twice = expand_instances(&templates, &periods, &once, floor);
        assert_eq!(once, twice);
    }

    #[test]
    fn skips_months_before_the_floor() {
        let templates = vec![BillTemplate::new("Electric", 150.0, 20).unwrap()];
        let floor = date(2026, 1, 1);
        let table = expand_instances(
            &templates,
            &winter_periods(),
            &AllocationTable::default(),
            floor,
        );
        assert!(table
            .unassigned
            .iter()
            .all(|bill| bill.due_date >= floor));
        assert_eq!(table.unassigned.len(), 3);
    }

    #[test]
    fn prunes_unassigned_instances_of_inactive_templates() {
        let mut templates = vec![
            BillTemplate::new("Electric", 150.0, 20).unwrap(),
            BillTemplate::new("Water", 80.0, 25).unwrap(),
        ];
        let floor = ScheduleSettings::default().floor_date;
        let periods = winter_periods();
        let table = expand_instances(&templates, &periods, &AllocationTable::default(), floor);
        templates[1].active = false;
        let pruned = expand_instances(&templates, &periods, &table, floor);
        assert!(pruned
            .unassigned
            .iter()
            .all(|bill| bill.template_name == "Electric"));
    }

    #[test]
    fn does_not_duplicate_assigned_occurrences() {
        use crate::plan::allocation::BillLocation;

        let templates = vec![BillTemplate::new("Electric", 150.0, 20).unwrap()];
        let floor = ScheduleSettings::default().floor_date;
        let periods = winter_periods();
        let table = expand_instances(&templates, &periods, &AllocationTable::default(), floor);
        let id = occurrence_id(templates[0].id, 2026, 1);
        let table = table
            .assign(id, BillLocation::Unassigned, 3, &periods)
            .unwrap();
        let again = expand_instances(&templates, &periods, &table, floor);
        assert_eq!(again, table);
    }
}
