use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::plan::PeriodId;

/// Error type that captures the failure modes of the allocation engine.
///
/// No variant is fatal: every operation that returns one of these leaves the
/// allocation table in its prior valid state.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("bill due {due} would already be late in the period starting {anchor}")]
    LateAssignment { due: NaiveDate, anchor: NaiveDate },
    #[error("split amount must be above zero and below {limit:.2}")]
    InvalidSplitAmount { limit: f64 },
    #[error("no bill instance with id {0}")]
    UnknownInstance(Uuid),
    #[error("no bill template with id {0}")]
    UnknownTemplate(Uuid),
    #[error("no pay period with id {0}")]
    UnknownPeriod(PeriodId),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
