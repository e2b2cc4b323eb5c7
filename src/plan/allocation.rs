use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::PlannerError;

use super::instance::{occurrence_id, BillInstance};
use super::period::{PayPeriod, PeriodId};

const SPLIT_SUFFIX: &str = " (Split)";

/// Where a bill instance currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillLocation {
    Unassigned,
    Period(PeriodId),
}

/// A bill instance occupying a pay period. The `paid` flag exists only here:
/// an instance in the unassigned pool has no paid status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignedBill {
    pub bill: BillInstance,
    pub paid: bool,
}

/// The authoritative mapping of bill instances to pay periods.
///
/// Invariant: every instance id appears in at most one location, either the
/// unassigned pool or exactly one period's list. All operations are pure
/// transitions: they return a new table on success and leave `self` untouched
/// on error, so each command either fully applies or fully no-ops. The
/// collaborator layer owns the single live value and swaps it on success.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AllocationTable {
    #[serde(default)]
    pub unassigned: Vec<BillInstance>,
    #[serde(default)]
    pub by_period: BTreeMap<PeriodId, Vec<AssignedBill>>,
}

/// The single hard business rule: a bill may only occupy a period whose
/// anchor date is on or before the bill's due date.
pub fn is_on_time(bill: &BillInstance, period: &PayPeriod) -> bool {
    period.anchor_date <= bill.due_date
}

/// Periods that are legal drop targets for the given instance, used by the
/// UI collaborator to preview assignments in flight.
pub fn valid_targets(bill: &BillInstance, periods: &[PayPeriod]) -> Vec<PeriodId> {
    periods
        .iter()
        .filter(|period| is_on_time(bill, period))
        .map(|period| period.id)
        .collect()
}

impl AllocationTable {
    pub fn location_of(&self, id: Uuid) -> Option<BillLocation> {
        if self.unassigned.iter().any(|bill| bill.id == id) {
            return Some(BillLocation::Unassigned);
        }
        self.by_period.iter().find_map(|(period_id, bills)| {
            bills
                .iter()
                .any(|assigned| assigned.bill.id == id)
                .then_some(BillLocation::Period(*period_id))
        })
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.location_of(id).is_some()
    }

    pub fn unassigned_bill(&self, id: Uuid) -> Option<&BillInstance> {
        self.unassigned.iter().find(|bill| bill.id == id)
    }

    pub fn assigned_bill(&self, period_id: PeriodId, id: Uuid) -> Option<&AssignedBill> {
        self.by_period
            .get(&period_id)?
            .iter()
            .find(|assigned| assigned.bill.id == id)
    }

    /// All assigned bills with the period they occupy.
    pub fn assigned_iter(&self) -> impl Iterator<Item = (PeriodId, &AssignedBill)> {
        self.by_period.iter().flat_map(|(period_id, bills)| {
            bills.iter().map(move |assigned| (*period_id, assigned))
        })
    }

    /// All live instances, assigned and unassigned alike.
    pub fn instances(&self) -> impl Iterator<Item = &BillInstance> {
        self.unassigned
            .iter()
            .chain(self.assigned_iter().map(|(_, assigned)| &assigned.bill))
    }

    pub fn assigned_total(&self, period_id: PeriodId) -> f64 {
        self.by_period
            .get(&period_id)
            .map(|bills| bills.iter().map(|assigned| assigned.bill.amount).sum())
            .unwrap_or(0.0)
    }

    /// Moves an instance into the target period.
    ///
    /// Rejected with `LateAssignment` when the target period's anchor falls
    /// after the bill's due date. Assigning out of the unassigned pool resets
    /// `paid`; moving between two periods preserves it.
    pub fn assign(
        &self,
        id: Uuid,
        source: BillLocation,
        target: PeriodId,
        periods: &[PayPeriod],
    ) -> Result<Self, PlannerError> {
        let target_period = periods
            .iter()
            .find(|period| period.id == target)
            .ok_or(PlannerError::UnknownPeriod(target))?;

        let mut next = self.clone();
        let (bill, paid) = match source {
            BillLocation::Unassigned => {
                let position = next
                    .unassigned
                    .iter()
                    .position(|bill| bill.id == id)
                    .ok_or(PlannerError::UnknownInstance(id))?;
                (next.unassigned.remove(position), false)
            }
            BillLocation::Period(source_id) => {
                let bills = next
                    .by_period
                    .get_mut(&source_id)
                    .ok_or(PlannerError::UnknownInstance(id))?;
                let position = bills
                    .iter()
                    .position(|assigned| assigned.bill.id == id)
                    .ok_or(PlannerError::UnknownInstance(id))?;
                let assigned = bills.remove(position);
                (assigned.bill, assigned.paid)
            }
        };

        if !is_on_time(&bill, target_period) {
            return Err(PlannerError::LateAssignment {
                due: bill.due_date,
                anchor: target_period.anchor_date,
            });
        }

        next.by_period
            .entry(target)
            .or_default()
            .push(AssignedBill { bill, paid });
        Ok(next)
    }

    /// Flips the paid flag of an assigned instance.
    pub fn toggle_paid(&self, period_id: PeriodId, id: Uuid) -> Result<Self, PlannerError> {
        let mut next = self.clone();
        let assigned = next
            .by_period
            .get_mut(&period_id)
            .and_then(|bills| bills.iter_mut().find(|assigned| assigned.bill.id == id))
            .ok_or(PlannerError::UnknownInstance(id))?;
        assigned.paid = !assigned.paid;
        Ok(next)
    }

    /// Splits an assigned instance into two amounts: the original stays in
    /// its period reduced by `partial` (name marked as split), and a new
    /// fragment holding `partial` lands in the unassigned pool.
    pub fn split(
        &self,
        period_id: PeriodId,
        id: Uuid,
        partial: f64,
    ) -> Result<Self, PlannerError> {
        let mut next = self.clone();
        let assigned = next
            .by_period
            .get_mut(&period_id)
            .and_then(|bills| bills.iter_mut().find(|assigned| assigned.bill.id == id))
            .ok_or(PlannerError::UnknownInstance(id))?;

        if !partial.is_finite() || partial <= 0.0 || partial >= assigned.bill.amount {
            return Err(PlannerError::InvalidSplitAmount {
                limit: assigned.bill.amount,
            });
        }

        let split_name = format!("{}{}", assigned.bill.template_name, SPLIT_SUFFIX);
        let fragment = BillInstance {
            id: Uuid::new_v4(),
            name: split_name.clone(),
            amount: partial,
            due_date: assigned.bill.template_due_date,
            template_id: assigned.bill.template_id,
            template_name: assigned.bill.template_name.clone(),
            template_due_date: assigned.bill.template_due_date,
        };
        assigned.bill.amount -= partial;
        assigned.bill.name = split_name;

        next.unassigned.push(fragment);
        Ok(next)
    }

    /// Removes an assigned instance from its period, merging it with any
    /// unassigned fragments of the same template/month lineage.
    ///
    /// When fragments exist, they collapse with the removed amount into one
    /// pool entry carrying the summed amount, the un-suffixed name, the
    /// original due date, and the lineage's deterministic occurrence id (a
    /// fresh id when that id is still live elsewhere in the table). With no
    /// fragments the instance is simply restored un-suffixed. The total
    /// amount across the lineage is conserved either way.
    pub fn remove(&self, period_id: PeriodId, id: Uuid) -> Result<Self, PlannerError> {
        let mut next = self.clone();
        let bills = next
            .by_period
            .get_mut(&period_id)
            .ok_or(PlannerError::UnknownInstance(id))?;
        let position = bills
            .iter()
            .position(|assigned| assigned.bill.id == id)
            .ok_or(PlannerError::UnknownInstance(id))?;
        let removed = bills.remove(position).bill;

        let same_lineage = |bill: &BillInstance| {
            bill.template_id == removed.template_id
                && bill.template_due_date == removed.template_due_date
        };
        let fragment_total: f64 = next
            .unassigned
            .iter()
            .filter(|bill| same_lineage(bill))
            .map(|bill| bill.amount)
            .sum();
        let has_fragments = next.unassigned.iter().any(|bill| same_lineage(bill));

        if has_fragments {
            next.unassigned.retain(|bill| !same_lineage(bill));
            let due = removed.template_due_date;
            let canonical = occurrence_id(removed.template_id, due.year(), due.month());
            let merged_id = if next.contains(canonical) {
                Uuid::new_v4()
            } else {
                canonical
            };
            next.unassigned.push(BillInstance {
                id: merged_id,
                name: removed.template_name.clone(),
                amount: fragment_total + removed.amount,
                due_date: due,
                template_id: removed.template_id,
                template_name: removed.template_name,
                template_due_date: due,
            });
        } else {
            let name = removed.template_name.clone();
            next.unassigned.push(BillInstance { name, ..removed });
        }
        Ok(next)
    }

    /// Drops unassigned instances whose template no longer qualifies
    /// (deactivated or deleted). Assigned instances are left alone.
    pub fn retain_unassigned(&mut self, keep: impl Fn(&BillInstance) -> bool) {
        self.unassigned.retain(|bill| keep(bill));
    }
}
