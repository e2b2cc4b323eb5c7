//! Plan domain models: bill templates, pay periods, dated bill instances,
//! the allocation table, recurrence expansion, and monthly status.

pub mod allocation;
pub mod expand;
pub mod instance;
pub mod period;
#[allow(clippy::module_inception)]
pub mod plan;
pub mod status;
pub mod template;

pub use allocation::{is_on_time, valid_targets, AllocationTable, AssignedBill, BillLocation};
pub use expand::expand_instances;
pub use instance::{occurrence_id, BillInstance};
pub use period::{
    generate_periods, IncomeSettings, PayPeriod, PeriodId, ScheduleSettings, ANCHOR_WEEKDAY,
    MAX_PERIODS,
};
pub use plan::{BudgetPlan, CURRENT_SCHEMA_VERSION};
pub use status::{monthly_status, MonthStatus};
pub use template::BillTemplate;
