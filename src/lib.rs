#![doc(test(attr(deny(warnings))))]

//! Payplan Core spreads a household's recurring bills across upcoming pay
//! periods so that each period's leftover spending money is known in advance.

pub mod cli;
pub mod clock;
pub mod config;
pub mod core;
pub mod errors;
pub mod plan;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Payplan Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
