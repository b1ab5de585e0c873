//! # zabbixbot
//!
//! Relays active Zabbix problems to Telegram on demand.
//!
//! The bot queries the Zabbix JSON-RPC API for the problems of a host group,
//! correlates every problem with its trigger and host, and answers chat
//! commands with one message per affected host.
//!
//! ## Architecture
//!
//! - **zabbix**: JSON-RPC client and wire types for `problem.get` / `trigger.get`
//! - **aggregator**: filters problems by severity and groups them by host
//! - **formatter**: renders aggregated problems as Telegram Markdown
//! - **bot**: command dispatch, Telegram long-polling and scheduled pushes
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the bot (reads data.env and the environment)
//! zabbixbot run
//!
//! # One-shot report for a single group
//! zabbixbot check --group 41
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod aggregator;
pub mod bot;
pub mod config;
pub mod error;
pub mod formatter;
pub mod models;
pub mod zabbix;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::aggregator::{format_duration, AggregationError, ProblemAggregator};
    pub use crate::bot::{Channel, ChannelEvent, Dispatcher, OutboundMessage, TelegramChannel};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::formatter::{Formatter, RenderError};
    pub use crate::models::*;
    pub use crate::zabbix::{JsonRpc, RpcClient, RpcError};
}
