//! Error types and error handling for the generator.
//!
//! This module defines the reports raised while lowering a program. It includes:
//!
//! - Error structures with source position information
//! - The two severities: warnings (collected) and critical errors (returned)
//! - Error names and tips used when rendering a report
//! - The warning sink handed to the code generator

pub mod diagnostics;
pub mod errors;
