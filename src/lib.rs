//! Clinical trial matching: registry lookup, age-based eligibility, and an
//! optional language-model explanation, served over HTTP or run from the CLI.

pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod sources;
pub mod transform;
