//! Core data types for components, findings, and audit reports.
//!
//! This module contains the fundamental types used throughout extaudit:
//!
//! - [`Component`] - An external component observed in a module's source
//! - [`Finding`] - A single diagnostic with its group label
//! - [`FindingGroup`] - The fixed finding taxonomy
//! - [`MessageBucket`] - The shared append-only diagnostic sink
//! - [`AuditReport`] - Complete audit results
//!
//! # Example
//!
//! ```
//! use extaudit::{FindingGroup, MessageBucket};
//!
//! let bucket = MessageBucket::new();
//! bucket.add(
//!     "No composer dependency found for \"magento/module-store\"",
//!     FindingGroup::MissingDependency,
//!     None,
//!     "Acme_Widget",
//! );
//!
//! println!("Collected {} findings", bucket.len());
//! ```

mod component;
mod finding;
mod report;

pub use component::*;
pub use finding::*;
pub use report::*;
