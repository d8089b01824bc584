//! CDI Operator Core - Input types for the CDI operator manifest generator
//!
//! This crate provides the values every emission starts from:
//! - `Config`: The immutable input record (namespace, versions, images)
//! - `ImageSet`: Component images with default filling
//! - `naming`: Object names, label keys and API coordinates

pub mod config;
pub mod error;
pub mod images;
pub mod naming;

pub use config::{Config, ConfigBuilder};
pub use error::{CoreError, Result};
pub use images::{ImageRole, ImageSet};
