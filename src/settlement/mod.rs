//! Settlement planning over net balances.

pub mod planner;
