//! # split-engine
//!
//! Group expense settlement and payment planning engine.
//!
//! Given a record of shared expenses (who paid, who consumed, how much),
//! this engine computes each participant's net position and produces a
//! settlement plan: a near-minimal, deterministic set of point-to-point
//! payments that clears every balance.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: participants, money, expenses, bills, balances
//! - **settlement** — Greedy settlement planning over net balances
//! - **simulation** — Random outing generation for stress testing
//!
//! All amounts are carried as integer minor units (cents); the zero-sum
//! invariant over balances is exact, never approximate.

pub mod core;
pub mod settlement;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::balance::BalanceSheet;
    pub use crate::core::bill::{Bill, BillItem};
    pub use crate::core::expense::{ExpenseItem, InvalidOutingError, Outing};
    pub use crate::core::money::Money;
    pub use crate::core::participant::ParticipantId;
    pub use crate::settlement::planner::{
        Payment, PaymentPlan, SettlementError, SettlementPlan, SettlementPlanner,
    };
}
