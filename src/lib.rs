pub mod checker;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod platform;
pub mod source;

pub use config::{Config, RuntimeConfig};
pub use error::{AuditError, Result};
pub use model::{AuditReport, Component, Finding, FindingGroup, MessageBucket};
