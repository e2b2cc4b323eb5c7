use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::PlannerError;

/// A recurring bill definition owned by the user.
///
/// Templates never carry dates themselves; the expander turns them into
/// dated [`super::BillInstance`] values, one per calendar month. Flipping
/// `active` off removes the template's not-yet-assigned instances while
/// leaving assigned ones in place until the user removes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillTemplate {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub due_day: u32,
    pub active: bool,
}

impl BillTemplate {
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        due_day: u32,
    ) -> Result<Self, PlannerError> {
        let name = name.into();
        validate(&name, amount, due_day)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            amount,
            due_day,
            active: true,
        })
    }
}

pub(crate) fn validate(name: &str, amount: f64, due_day: u32) -> Result<(), PlannerError> {
    if name.trim().is_empty() {
        return Err(PlannerError::InvalidInput("bill name is required".into()));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PlannerError::InvalidInput(
            "bill amount must be above zero".into(),
        ));
    }
    if !(1..=31).contains(&due_day) {
        return Err(PlannerError::InvalidInput(
            "due day must be between 1 and 31".into(),
        ));
    }
    Ok(())
}
