//! Sea-ORM entities backing the log store and the settings store.

pub mod app_setting;
pub mod mail_log;
