//! Core domain types for mapscout.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

#![allow(clippy::missing_errors_doc)]

mod model;
mod place;
mod query;
mod sanitize;

pub use model::{ApiKey, DEFAULT_MODEL, ModelName, ModelParseError};
pub use place::{GeoLocation, GeoLocationError, Place, SearchResponse};
pub use query::{EmptyQueryError, SearchQuery};
pub use sanitize::{sanitize_single_line, sanitize_terminal_text};
