pub mod classify;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod sink;
pub mod source;
pub mod util;

pub use error::{BatchError, BatchResult};
