//! quizgrade-core: answer normalization, validation and grading.
//!
//! This crate turns loosely shaped quiz questions and lesson steps into
//! canonical typed payloads, validates takers' answers against them with
//! partial credit, and rolls the results up into scores, grades and
//! cross-attempt statistics.

pub mod coerce;
pub mod config;
pub mod engine;
pub mod error;
pub mod grading;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod results;
pub mod statistics;
pub mod template;
pub mod validate;

pub use error::GradingError;
