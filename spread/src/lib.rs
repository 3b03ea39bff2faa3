//! Daily commit counts per repository topic, collected from the Github API.
//!
//! A run lists the repositories visible to an access token, fetches each
//! repository's topics and the commits authored by one account, folds them
//! into [DailySummary] records, and merges those into a JSON history file.

pub mod aggregate;
pub mod config;
pub mod history;
pub mod pipeline;

pub use crate::aggregate::{Aggregator, DailySummary};
pub use crate::config::{Config, ConfigError};
pub use crate::history::{History, HistoryError, MergePolicy};
pub use crate::pipeline::{collect, Collected};
