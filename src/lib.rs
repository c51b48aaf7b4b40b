// src/lib.rs - karmabot library root

pub mod bot;
pub mod cli;
pub mod identity;
pub mod infra;
pub mod karma;
pub mod ledger;
pub mod release;
