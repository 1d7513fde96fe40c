//! One-shot maintenance tooling that moves a forum schema off its legacy raw
//! user id columns and onto denormalized actor reference columns.

pub mod actor;
pub mod backfill;
pub mod db;
pub mod orm;
pub mod update_log;
