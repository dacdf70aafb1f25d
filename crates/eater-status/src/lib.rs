//! Status attribute registry.
//!
//! A [`StatusRegistry`] is a flat directory of named, read-only text
//! attributes. Each attribute is backed by a callback owned by whoever
//! registered it; reading the attribute runs the callback and returns
//! its value terminated by a newline.
//!
//! The registry never holds its own lock while a callback runs, so a
//! callback may freely take locks of the component it describes.

pub mod error;
pub mod registry;

pub use error::StatusError;
pub use registry::{StatusAttr, StatusRegistry};
