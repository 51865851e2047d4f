//! Terminal tracker for how you spend your hours and your money. Weekly
//! hour grids and monthly expense records live in per-user JSON documents,
//! aggregated into category breakdowns, budget usage and simple insights.
//!

pub mod cli;
pub mod expense;
pub mod session;
pub mod store;
pub mod tracker;
pub mod utils;
