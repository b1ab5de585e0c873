//! Data models for zabbixbot

mod problem;

pub use problem::*;
