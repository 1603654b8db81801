//! Common utilities and shared types for evote-rs.
//!
//! This crate provides foundational components used across all evote-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based public identifiers via [`IdGenerator`]
//! - **Money**: Minor-unit conversions for processor amounts
//!
//! # Example
//!
//! ```no_run
//! use evote_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod money;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use money::{MINOR_UNITS_PER_MAJOR, charge_amount, from_minor_units, to_minor_units};
