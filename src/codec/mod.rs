//! Conversion between wire configuration values and user units.
//!
//! - [`value`]: fixed-width signed/unsigned parameter values
//! - [`domain`]: scaled, split-range and sentinel mappings
//! - [`level`]: multilevel switch 0..99 scale

pub mod domain;
pub mod level;
pub mod value;

pub use domain::{DomainSpec, LinearRange, NegativeBand, clamp};
pub use level::{LEVEL_MAX, LEVEL_RESTORE, decode_level, encode_level};
pub use value::{ConfigurationValue, ValueSize};
