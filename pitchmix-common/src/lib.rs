//! # PitchMix Common Library
//!
//! Shared code for the PitchMix viewer modules including:
//! - Domain types (pitchers, situations, usage, recommendations, pitch events)
//! - Event types (ViewEvent enum) and the EventBus
//! - Configuration resolution (API base URL)
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use types::{Hand, Situation};
