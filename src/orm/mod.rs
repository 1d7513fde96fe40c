pub mod actors;
pub mod update_log;
pub mod users;
