//! Core runtime infrastructure.
//!
//! This module contains the essential components for running Bulletin:
//! - [`config`] - Configuration parsing and validation
//! - [`runtime`] - Main runtime orchestration
//! - [`error`] - Error types and the conversion into wire errors

pub mod config;
pub mod error;
pub mod runtime;
