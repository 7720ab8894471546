//! Event types for the PitchMix view pipeline
//!
//! Provides the ViewEvent enum and the EventBus used to push committed state
//! transitions from the session orchestrator to the presentation layer.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Hand, Situation};

/// View pipeline events
///
/// Emitted by the session orchestrator after a state transition commits.
/// Stale (superseded) resolver responses are dropped and emit nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewEvent {
    /// Roster fetch completed and the pitcher selector became usable
    RosterLoaded {
        pitcher_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Roster fetch failed; selector stays empty, no automatic retry
    RosterFailed {
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User changed the selected pitcher (None = deselected)
    PitcherSelected {
        pitcher_id: Option<i64>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User changed balls, strikes, or batter hand
    SituationChanged {
        situation: Situation,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// UsageByCount was replaced wholesale
    UsageUpdated {
        pitcher_id: i64,
        batter_hand: Hand,
        count_keys: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new recommendation was committed for the live situation
    RecommendationUpdated {
        pitcher_id: i64,
        situation: Situation,
        recommended_pitch_type: String,
        confidence: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Classified locations for the recommended pitch type were committed
    LocationsUpdated {
        pitcher_id: i64,
        pitch_type: String,
        whiffs: usize,
        hits_in_play: usize,
        other: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// All derived state was cleared (pitcher deselected)
    ViewCleared {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution bus for view pipeline events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the orchestrator)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ViewEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ViewEvent,
    ) -> Result<usize, broadcast::error::SendError<ViewEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// The orchestrator uses this for all emissions: the pipeline is correct
    /// whether or not a presentation layer is attached.
    pub fn emit_lossy(&self, event: ViewEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
