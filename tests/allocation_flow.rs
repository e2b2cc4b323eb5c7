use chrono::NaiveDate;
use payplan_core::errors::PlannerError;
use payplan_core::plan::{
    occurrence_id, AllocationTable, AssignedBill, BillLocation, BudgetPlan, ScheduleSettings,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Sixteen weekly periods starting 2025-12-19, reaching into early April.
fn spring_settings() -> ScheduleSettings {
    ScheduleSettings {
        total_periods: 16,
        ..Default::default()
    }
}

fn seeded_plan() -> BudgetPlan {
    let mut plan = BudgetPlan::new();
    plan.add_template("Electric", 150.0, 20).unwrap();
    plan.regenerate_periods(date(2026, 1, 7), &spring_settings());
    plan.refresh_instances(spring_settings().floor_date);
    plan
}

#[test]
fn electric_march_worked_example() {
    let mut plan = seeded_plan();
    let electric = plan.templates[0].id;
    let march = occurrence_id(electric, 2026, 3);

    // The March instance exists once, due 2026-03-20, amount 150.
    let instance = plan.find_instance(march).expect("march instance expanded");
    assert_eq!(instance.due_date, date(2026, 3, 20));
    assert_eq!(instance.amount, 150.0);

    // Assigning to the period anchored 03-13 is on time.
    assert_eq!(plan.period(13).unwrap().anchor_date, date(2026, 3, 13));
    plan.assign(march, BillLocation::Unassigned, 13).unwrap();

    // Moving it to the period anchored 03-27 would be late.
    assert_eq!(plan.period(15).unwrap().anchor_date, date(2026, 3, 27));
    let err = plan
        .assign(march, BillLocation::Period(13), 15)
        .unwrap_err();
    assert!(matches!(err, PlannerError::LateAssignment { .. }));
    assert!(plan.allocations.assigned_bill(13, march).is_some());

    // Splitting by 50 leaves an assigned 100 remainder and pools a 50 piece.
    plan.split(13, march, 50.0).unwrap();
    let remainder = plan.allocations.assigned_bill(13, march).unwrap();
    assert_eq!(remainder.bill.amount, 100.0);
    assert_eq!(remainder.bill.name, "Electric (Split)");
    let fragment = plan
        .allocations
        .unassigned
        .iter()
        .find(|bill| bill.amount == 50.0)
        .expect("split fragment pooled");
    assert_eq!(fragment.name, "Electric (Split)");
    assert_eq!(fragment.due_date, date(2026, 3, 20));

    // Removing the assigned remainder merges back into one 150 instance.
    plan.remove_assigned(13, march).unwrap();
    let merged = plan
        .allocations
        .unassigned
        .iter()
        .find(|bill| bill.id == march)
        .expect("merged instance carries the occurrence id");
    assert_eq!(merged.amount, 150.0);
    assert_eq!(merged.name, "Electric");
    assert_eq!(merged.due_date, date(2026, 3, 20));
}

#[test]
fn merge_only_collapses_the_same_month_lineage() {
    let mut plan = seeded_plan();
    let electric = plan.templates[0].id;
    let february = occurrence_id(electric, 2026, 2);
    let march = occurrence_id(electric, 2026, 3);

    plan.assign(march, BillLocation::Unassigned, 13).unwrap();
    plan.split(13, march, 50.0).unwrap();
    plan.remove_assigned(13, march).unwrap();

    // The February occurrence is untouched by the March merge.
    let february_bill = plan.find_instance(february).unwrap();
    assert_eq!(february_bill.amount, 150.0);
    let march_bill = plan.find_instance(march).unwrap();
    assert_eq!(march_bill.amount, 150.0);
}

#[test]
fn expansion_stays_idempotent_after_a_merge() {
    let mut plan = seeded_plan();
    let electric = plan.templates[0].id;
    let march = occurrence_id(electric, 2026, 3);

    plan.assign(march, BillLocation::Unassigned, 13).unwrap();
    plan.split(13, march, 50.0).unwrap();
    plan.remove_assigned(13, march).unwrap();

    // The merged instance reclaims the deterministic March id, so another
    // expander run cannot mint a duplicate March occurrence.
    let before = plan.allocations.clone();
    plan.refresh_instances(spring_settings().floor_date);
    assert_eq!(plan.allocations, before);
}

#[test]
fn conservation_holds_across_repeated_splits_and_removals() {
    let mut plan = seeded_plan();
    let electric = plan.templates[0].id;
    let march = occurrence_id(electric, 2026, 3);

    plan.assign(march, BillLocation::Unassigned, 13).unwrap();
    plan.split(13, march, 20.0).unwrap();
    plan.split(13, march, 40.0).unwrap();
    plan.split(13, march, 60.0).unwrap();

    let march_total = |plan: &BudgetPlan| -> f64 {
        plan.allocations
            .instances()
            .filter(|bill| bill.template_due_date == date(2026, 3, 20))
            .map(|bill| bill.amount)
            .sum()
    };
    assert_eq!(march_total(&plan), 150.0);

    plan.remove_assigned(13, march).unwrap();
    assert_eq!(march_total(&plan), 150.0);

    let merged = plan
        .allocations
        .unassigned
        .iter()
        .find(|bill| bill.id == march)
        .unwrap();
    assert_eq!(merged.amount, 150.0);
}

#[test]
fn deactivation_cascade_removes_only_unassigned_instances() {
    let mut plan = BudgetPlan::new();
    plan.add_template("Electric", 150.0, 20).unwrap();
    plan.add_template("Water", 80.0, 25).unwrap();
    plan.regenerate_periods(date(2026, 1, 7), &spring_settings());
    plan.refresh_instances(spring_settings().floor_date);

    let water = plan.templates[1].id;
    let january = occurrence_id(water, 2026, 1);
    plan.assign(january, BillLocation::Unassigned, 3).unwrap();

    plan.set_template_active(water, false).unwrap();
    plan.refresh_instances(spring_settings().floor_date);

    assert!(plan
        .allocations
        .unassigned
        .iter()
        .all(|bill| bill.template_id != water));
    assert!(plan.allocations.assigned_bill(3, january).is_some());
}

#[test]
fn monthly_completeness_flips_when_an_assignment_goes_late() {
    let mut plan = seeded_plan();
    let electric = plan.templates[0].id;
    let march = occurrence_id(electric, 2026, 3);
    plan.assign(march, BillLocation::Unassigned, 13).unwrap();

    let status = plan.monthly_status(2026);
    assert!(status[2].complete);
    assert_eq!((status[2].total, status[2].assigned), (1, 1));

    // Simulate regeneration drift: the same table keyed against a period
    // whose anchor now falls after the due date. The validator check in the
    // aggregator flips the month incomplete even though counts still match.
    let mut drifted: AllocationTable = plan.allocations.clone();
    let moved = drifted
        .by_period
        .get_mut(&13)
        .and_then(|bills| bills.pop())
        .unwrap();
    drifted
        .by_period
        .entry(15)
        .or_default()
        .push(AssignedBill {
            bill: moved.bill,
            paid: moved.paid,
        });
    let drifted_status =
        payplan_core::plan::monthly_status(&drifted, &plan.periods, 2026);
    assert_eq!(
        (drifted_status[2].total, drifted_status[2].assigned),
        (1, 1)
    );
    assert!(!drifted_status[2].complete);
}

#[test]
fn splitting_an_unknown_instance_changes_nothing() {
    let mut plan = seeded_plan();
    let before = plan.allocations.clone();
    let err = plan
        .split(13, uuid::Uuid::new_v4(), 50.0)
        .unwrap_err();
    assert!(matches!(err, PlannerError::UnknownInstance(_)));
    assert_eq!(plan.allocations, before);
}

#[test]
fn merged_instance_falls_back_to_a_fresh_id_when_the_occurrence_is_live() {
    let mut plan = seeded_plan();
    let electric = plan.templates[0].id;
    let march = occurrence_id(electric, 2026, 3);

    // Split twice and assign one fragment elsewhere, so the occurrence-id
    // instance stays assigned while a fragment merge happens.
    plan.assign(march, BillLocation::Unassigned, 13).unwrap();
    plan.split(13, march, 30.0).unwrap();
    plan.split(13, march, 20.0).unwrap();
    let fragment_id = plan
        .allocations
        .unassigned
        .iter()
        .find(|bill| bill.amount == 30.0)
        .unwrap()
        .id;
    plan.assign(fragment_id, BillLocation::Unassigned, 14)
        .unwrap();

    plan.remove_assigned(14, fragment_id).unwrap();

    // The assigned remainder still owns the deterministic id, so the merged
    // pool entry took a fresh one and the uniqueness invariant held.
    assert!(plan.allocations.assigned_bill(13, march).is_some());
    let merged = plan
        .allocations
        .unassigned
        .iter()
        .find(|bill| bill.amount == 50.0)
        .expect("fragments merged");
    assert_ne!(merged.id, march);
    let ids: Vec<_> = plan.allocations.instances().map(|bill| bill.id).collect();
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(ids.len(), deduped.len());
}
