//! msgblast - bulk personalized message dispatch
//!
//! msgblast takes a spreadsheet of recipients and a `{field}` message
//! template, then sends one personalized message per recipient through a
//! remote messaging API, pacing requests with a configurable delay and
//! reporting per-recipient success/failure.
//!
//! # Core Concepts
//!
//! - **Strictly Sequential**: one send in flight at a time; send and delay
//!   suspensions alternate to respect downstream rate limits
//! - **One Attempt Per Recipient**: each valid row yields exactly one
//!   dispatch outcome, never retried
//! - **Failures Are Data**: a failed recipient is recorded in the run
//!   summary and the run continues
//!
//! # Modules
//!
//! - [`rows`] - Recipient file extraction
//! - [`template`] - `{field}` placeholder rendering
//! - [`gateway`] - Dispatch client trait and HTTP implementation
//! - [`sender`] - Bulk dispatch sequencer
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod gateway;
pub mod rows;
pub mod sender;
pub mod template;

// Re-export commonly used types
pub use config::{Config, GatewayConfig, SendConfig};
pub use gateway::{DispatchOutcome, GatewayError, HttpGateway, MessageGateway};
pub use rows::{NUMBER_FIELD, RecipientRow, RowError, RowSet, extract};
pub use sender::{BulkSender, CancelFlag, Progress, RunSummary};
pub use template::Template;
