//! Core processing applied to a conversation after rendering.
//!
//! This module contains:
//! - [`threads`] - Moving thread replies under their parent
//! - [`filter`] - Message filtering by date and subtype
//!
//! # Quick Start
//!
//! ```rust
//! use slackview::core::{FilterConfig, apply_filters, build_threads};
//! ```

pub mod filter;
pub mod threads;

// Re-export main functions for convenience
pub use filter::{FilterConfig, apply_filters};
pub use threads::build_threads;

// Re-export Message from the crate root
pub use crate::Message;
