//! Foundational value types: participants, money, expenses, bills, balances.

pub mod balance;
pub mod bill;
pub mod expense;
pub mod money;
pub mod participant;
