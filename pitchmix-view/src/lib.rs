//! pitchmix-view library interface
//!
//! The situational recommendation display pipeline: an API client for the
//! pitch analytics service, the resolver cascade (roster → usage →
//! recommendation → locations) with its staleness guard, and the outcome
//! classifier for the location scatter view.

pub mod classify;
pub mod client;
pub mod session;
pub mod zone;

pub use crate::client::{ClientError, PitchMixApi, PitchMixClient, PitchesResponse};
pub use crate::session::{RosterState, ViewSession};
