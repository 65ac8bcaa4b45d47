#![deny(warnings)]

//! Runtime glue for the mining ledger: configuration, datasets, and the view
//! sessions that recompute rollups and publish them as atomic snapshots.

pub mod config;
pub mod dataset;
pub mod publish;
pub mod session;

pub use config::{ConfigError, LedgerConfig, WindowConfig};
pub use dataset::Dataset;
pub use publish::Published;
pub use session::{MiningGraphSession, ReprocessingSession};
