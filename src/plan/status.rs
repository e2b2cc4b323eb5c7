use std::collections::HashSet;

use chrono::Datelike;
use uuid::Uuid;

use super::allocation::{is_on_time, AllocationTable};
use super::period::PayPeriod;

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Assignment summary for one calendar month. `total` and `assigned` count
/// distinct template lineages, not individual fragments. Derived on demand,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthStatus {
    pub month: u32,
    pub name: &'static str,
    pub total: usize,
    pub assigned: usize,
    pub complete: bool,
}

/// Derives the per-month completion row for a year, fresh from the table and
/// period list on every call. A month is complete when every lineage due in
/// it is assigned and every assigned instance sits in an on-time period.
pub fn monthly_status(
    table: &AllocationTable,
    periods: &[PayPeriod],
    year: i32,
) -> Vec<MonthStatus> {
    (1..=12)
        .map(|month| {
            let in_month = |bill: &super::instance::BillInstance| {
                bill.due_date.year() == year && bill.due_date.month() == month
            };

            let total_lineages: HashSet<Uuid> = table
                .instances()
                .filter(|bill| in_month(bill))
                .map(|bill| bill.template_id)
                .collect();

            let mut assigned_lineages: HashSet<Uuid> = HashSet::new();
            let mut all_on_time = true;
            for (period_id, assigned) in table.assigned_iter() {
                if !in_month(&assigned.bill) {
                    continue;
                }
                assigned_lineages.insert(assigned.bill.template_id);
                let on_time = periods
                    .iter()
                    .find(|period| period.id == period_id)
                    .is_some_and(|period| is_on_time(&assigned.bill, period));
                if !on_time {
                    all_on_time = false;
                }
            }

            let total = total_lineages.len();
            let assigned = assigned_lineages.len();
            MonthStatus {
                month,
                name: MONTH_NAMES[month as usize - 1],
                total,
                assigned,
                complete: total > 0 && assigned == total && all_on_time,
            }
        })
        .collect()
}
