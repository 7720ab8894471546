//! View session orchestrator
//!
//! Owns the selected pitcher, the live situation, and all derived state
//! (usage by count, recommendation, classified locations). Any change to the
//! situation triggers a cascade: the usage and recommendation resolvers run
//! from their own triggers, and the location resolver is gated on the latest
//! committed recommendation.
//!
//! Every resolver request carries a ticket capturing its epoch and the
//! snapshot it was issued for. State is committed only when the ticket's
//! epoch is still live; superseded responses are dropped silently. Each
//! resolver is split into `begin_*` (bump epoch, clear per contract, build
//! ticket) and `complete_*` (commit or discard), composed by the async
//! `refresh_*` wrappers. All state writes happen in `complete_*`.

use chrono::Utc;
use tracing::{debug, info, warn};

use pitchmix_common::events::{EventBus, ViewEvent};
use pitchmix_common::types::{
    ClassifiedPitchPoint, Hand, Pitcher, Recommendation, Situation, UsageByCount,
};
use pitchmix_common::{Error, Result};

use crate::classify::{classify_locations, count_categories};
use crate::client::{ClientError, PitchMixApi, PitchesResponse};
use crate::zone::ZoneBounds;

/// Roster loading state
///
/// The pitcher selector is unusable until `Ready`; selection attempts while
/// `Loading` are rejected so an undefined pitcher can never be selected.
#[derive(Debug, Clone)]
pub enum RosterState {
    Loading,
    Ready(Vec<Pitcher>),
    Failed(String),
}

/// Ticket for one usage request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageTicket {
    epoch: u64,
    pitcher_id: i64,
    batter_hand: Hand,
}

/// Ticket for one recommendation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationTicket {
    epoch: u64,
    pitcher_id: i64,
    situation: Situation,
}

/// Ticket for one location request, pinned to the recommendation that gated it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTicket {
    epoch: u64,
    pitcher_id: i64,
    situation: Situation,
    pitch_type: String,
}

/// The situational recommendation display session
///
/// Single-threaded: resolvers run on the caller's task and suspend only at
/// the network boundary, so no locking is needed. The only hazard is a
/// logical stale overwrite, handled by the epoch tickets.
pub struct ViewSession<A: PitchMixApi> {
    api: A,
    event_bus: EventBus,

    roster: RosterState,
    selected_pitcher: Option<i64>,
    situation: Situation,

    usage: UsageByCount,
    recommendation: Option<Recommendation>,
    locations: Vec<ClassifiedPitchPoint>,
    zone: Option<ZoneBounds>,

    usage_epoch: u64,
    recommendation_epoch: u64,
    location_epoch: u64,
}

impl<A: PitchMixApi> ViewSession<A> {
    pub fn new(api: A, event_bus: EventBus) -> Self {
        Self {
            api,
            event_bus,
            roster: RosterState::Loading,
            selected_pitcher: None,
            situation: Situation::default(),
            usage: UsageByCount::new(),
            recommendation: None,
            locations: Vec::new(),
            zone: None,
            usage_epoch: 0,
            recommendation_epoch: 0,
            location_epoch: 0,
        }
    }

    // ------------------------------------------------------------------
    // Read accessors (the presentation layer only reads)
    // ------------------------------------------------------------------

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn roster(&self) -> &RosterState {
        &self.roster
    }

    /// Loaded pitchers, in server order; empty unless the roster is ready
    pub fn pitchers(&self) -> &[Pitcher] {
        match &self.roster {
            RosterState::Ready(pitchers) => pitchers,
            _ => &[],
        }
    }

    pub fn selected_pitcher(&self) -> Option<i64> {
        self.selected_pitcher
    }

    pub fn situation(&self) -> Situation {
        self.situation
    }

    pub fn usage(&self) -> &UsageByCount {
        &self.usage
    }

    /// Usage entries for the live count key; None means "no data"
    pub fn usage_for_current_count(&self) -> Option<&[pitchmix_common::types::UsageEntry]> {
        self.usage
            .get(&self.situation.count_key())
            .map(Vec::as_slice)
    }

    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.recommendation.as_ref()
    }

    pub fn locations(&self) -> &[ClassifiedPitchPoint] {
        &self.locations
    }

    pub fn zone(&self) -> Option<ZoneBounds> {
        self.zone
    }

    // ------------------------------------------------------------------
    // Roster loader
    // ------------------------------------------------------------------

    /// Fetch the pitcher roster; called exactly once at startup.
    ///
    /// On failure the roster moves to `Failed`, the collection stays empty,
    /// and the error is surfaced to the caller. No automatic retry.
    pub async fn load_roster(&mut self) -> Result<()> {
        match self.api.list_pitchers().await {
            Ok(pitchers) => {
                info!(count = pitchers.len(), "Roster loaded");
                self.event_bus.emit_lossy(ViewEvent::RosterLoaded {
                    pitcher_count: pitchers.len(),
                    timestamp: Utc::now(),
                });
                self.roster = RosterState::Ready(pitchers);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Roster load failed");
                self.event_bus.emit_lossy(ViewEvent::RosterFailed {
                    message: message.clone(),
                    timestamp: Utc::now(),
                });
                self.roster = RosterState::Failed(message.clone());
                Err(Error::Transport(message))
            }
        }
    }

    // ------------------------------------------------------------------
    // User input
    // ------------------------------------------------------------------

    /// Change the selected pitcher. `None` deselects and clears usage,
    /// recommendation, and locations in one state transition.
    pub async fn select_pitcher(&mut self, pitcher_id: Option<i64>) -> Result<()> {
        match pitcher_id {
            Some(id) => {
                match &self.roster {
                    RosterState::Loading => {
                        return Err(Error::InvalidInput(
                            "Roster still loading; selection unavailable".to_string(),
                        ));
                    }
                    RosterState::Failed(message) => {
                        return Err(Error::InvalidInput(format!(
                            "Roster unavailable: {}",
                            message
                        )));
                    }
                    RosterState::Ready(pitchers) => {
                        if !pitchers.iter().any(|p| p.id == id) {
                            return Err(Error::NotFound(format!("No pitcher with id {}", id)));
                        }
                    }
                }

                self.selected_pitcher = Some(id);
                self.event_bus.emit_lossy(ViewEvent::PitcherSelected {
                    pitcher_id: Some(id),
                    timestamp: Utc::now(),
                });

                self.refresh_usage().await;
                self.refresh_recommendation().await
            }
            None => {
                self.clear_derived_state();
                self.event_bus.emit_lossy(ViewEvent::PitcherSelected {
                    pitcher_id: None,
                    timestamp: Utc::now(),
                });
                Ok(())
            }
        }
    }

    /// Change the ball count. Re-resolves the recommendation (and gated
    /// locations) only; usage depends solely on pitcher and batter hand.
    pub async fn set_balls(&mut self, balls: u8) -> Result<()> {
        let next = Situation::new(balls, self.situation.strikes, self.situation.batter_hand)?;
        if next == self.situation {
            return Ok(());
        }
        self.situation = next;
        self.emit_situation_changed();
        self.refresh_recommendation().await
    }

    /// Change the strike count. Same trigger scope as `set_balls`.
    pub async fn set_strikes(&mut self, strikes: u8) -> Result<()> {
        let next = Situation::new(self.situation.balls, strikes, self.situation.batter_hand)?;
        if next == self.situation {
            return Ok(());
        }
        self.situation = next;
        self.emit_situation_changed();
        self.refresh_recommendation().await
    }

    /// Change the batter hand. Re-resolves usage and the recommendation.
    pub async fn set_batter_hand(&mut self, batter_hand: Hand) -> Result<()> {
        if batter_hand == self.situation.batter_hand {
            return Ok(());
        }
        self.situation.batter_hand = batter_hand;
        self.emit_situation_changed();

        self.refresh_usage().await;
        self.refresh_recommendation().await
    }

    fn emit_situation_changed(&self) {
        self.event_bus.emit_lossy(ViewEvent::SituationChanged {
            situation: self.situation,
            timestamp: Utc::now(),
        });
    }

    /// Single transition to the empty/absent state. Bumps every epoch so any
    /// in-flight response is superseded.
    fn clear_derived_state(&mut self) {
        self.selected_pitcher = None;
        self.usage_epoch += 1;
        self.recommendation_epoch += 1;
        self.location_epoch += 1;
        self.usage.clear();
        self.recommendation = None;
        self.locations.clear();
        self.zone = None;
        self.event_bus.emit_lossy(ViewEvent::ViewCleared {
            timestamp: Utc::now(),
        });
    }

    // ------------------------------------------------------------------
    // Usage resolver
    // ------------------------------------------------------------------

    /// Open a usage resolution cycle. Returns `None` (after resolving to an
    /// empty map, no network call) when no pitcher is selected.
    pub fn begin_usage(&mut self) -> Option<UsageTicket> {
        self.usage_epoch += 1;
        match self.selected_pitcher {
            Some(pitcher_id) => Some(UsageTicket {
                epoch: self.usage_epoch,
                pitcher_id,
                batter_hand: self.situation.batter_hand,
            }),
            None => {
                self.usage.clear();
                None
            }
        }
    }

    /// Commit or discard a usage response.
    ///
    /// Failures degrade to "no usage for this situation": the map is cleared
    /// rather than left holding a previous pitcher's data, and nothing is
    /// surfaced to the user.
    pub fn complete_usage(
        &mut self,
        ticket: UsageTicket,
        result: std::result::Result<UsageByCount, ClientError>,
    ) {
        if ticket.epoch != self.usage_epoch {
            debug!(
                pitcher_id = ticket.pitcher_id,
                batter_hand = %ticket.batter_hand,
                "Dropping superseded usage response"
            );
            return;
        }

        match result {
            Ok(usage) => {
                self.event_bus.emit_lossy(ViewEvent::UsageUpdated {
                    pitcher_id: ticket.pitcher_id,
                    batter_hand: ticket.batter_hand,
                    count_keys: usage.len(),
                    timestamp: Utc::now(),
                });
                self.usage = usage;
            }
            Err(e) => {
                warn!(
                    pitcher_id = ticket.pitcher_id,
                    error = %e,
                    "Usage fetch failed; clearing to empty"
                );
                self.usage.clear();
            }
        }
    }

    /// Issue and apply one usage resolution for the live state.
    pub async fn refresh_usage(&mut self) {
        let Some(ticket) = self.begin_usage() else {
            return;
        };
        let result = self
            .api
            .pitcher_usage(ticket.pitcher_id, ticket.batter_hand)
            .await;
        self.complete_usage(ticket, result);
    }

    // ------------------------------------------------------------------
    // Recommendation resolver
    // ------------------------------------------------------------------

    /// Open a recommendation resolution cycle.
    ///
    /// Clears the displayed recommendation and classified locations up front
    /// so the UI never shows results for a stale situation while the new
    /// request is in flight. Returns `None` when no pitcher is selected.
    pub fn begin_recommendation(&mut self) -> Option<RecommendationTicket> {
        self.recommendation_epoch += 1;
        // Supersede any in-flight location fetch gated on the old result
        self.location_epoch += 1;

        self.recommendation = None;
        self.locations.clear();
        self.zone = None;

        self.selected_pitcher.map(|pitcher_id| RecommendationTicket {
            epoch: self.recommendation_epoch,
            pitcher_id,
            situation: self.situation,
        })
    }

    /// Commit or discard a recommendation response.
    ///
    /// Returns `Ok(true)` when the response was committed (and the location
    /// resolver should run), `Ok(false)` when it was superseded. Transport
    /// failures are surfaced to the caller with the recommendation absent.
    pub fn complete_recommendation(
        &mut self,
        ticket: RecommendationTicket,
        result: std::result::Result<Recommendation, ClientError>,
    ) -> Result<bool> {
        if ticket.epoch != self.recommendation_epoch {
            debug!(
                pitcher_id = ticket.pitcher_id,
                count = %ticket.situation.count_key(),
                "Dropping superseded recommendation response"
            );
            return Ok(false);
        }

        match result {
            Ok(recommendation) => {
                info!(
                    pitcher_id = ticket.pitcher_id,
                    count = %ticket.situation.count_key(),
                    pitch_type = %recommendation.recommended_pitch_type,
                    "Recommendation committed"
                );
                self.event_bus.emit_lossy(ViewEvent::RecommendationUpdated {
                    pitcher_id: ticket.pitcher_id,
                    situation: ticket.situation,
                    recommended_pitch_type: recommendation.recommended_pitch_type.clone(),
                    confidence: recommendation.confidence,
                    timestamp: Utc::now(),
                });
                self.recommendation = Some(recommendation);
                Ok(true)
            }
            Err(e) => {
                self.recommendation = None;
                Err(Error::Transport(e.to_string()))
            }
        }
    }

    /// Issue and apply one recommendation resolution, then run the gated
    /// location resolver if the result was committed.
    pub async fn refresh_recommendation(&mut self) -> Result<()> {
        let Some(ticket) = self.begin_recommendation() else {
            return Ok(());
        };
        let result = self.api.recommend(ticket.pitcher_id, ticket.situation).await;
        let committed = self.complete_recommendation(ticket, result)?;
        if committed {
            self.refresh_locations().await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Location resolver & classifier
    // ------------------------------------------------------------------

    /// Open a location resolution cycle. Requires both a selected pitcher
    /// and a committed recommendation; otherwise the classified set and zone
    /// bounds are cleared and no request is issued.
    pub fn begin_locations(&mut self) -> Option<LocationTicket> {
        self.location_epoch += 1;

        let pitcher_id = self.selected_pitcher;
        let pitch_type = self
            .recommendation
            .as_ref()
            .map(|r| r.recommended_pitch_type.clone());

        match (pitcher_id, pitch_type) {
            (Some(pitcher_id), Some(pitch_type)) => Some(LocationTicket {
                epoch: self.location_epoch,
                pitcher_id,
                situation: self.situation,
                pitch_type,
            }),
            _ => {
                self.locations.clear();
                self.zone = None;
                None
            }
        }
    }

    /// Commit or discard a location response.
    ///
    /// On commit the raw events are filtered to the ticket's recommended
    /// pitch type, classified, and windowed; zone bounds come from the
    /// response averages with the fixed fallback band. Failures degrade
    /// silently to the empty set.
    pub fn complete_locations(
        &mut self,
        ticket: LocationTicket,
        result: std::result::Result<PitchesResponse, ClientError>,
    ) {
        if ticket.epoch != self.location_epoch {
            debug!(
                pitcher_id = ticket.pitcher_id,
                count = %ticket.situation.count_key(),
                pitch_type = %ticket.pitch_type,
                "Dropping superseded location response"
            );
            return;
        }

        match result {
            Ok(response) => {
                self.zone = Some(ZoneBounds::from_averages(
                    response.avg_sz_top,
                    response.avg_sz_bot,
                ));
                self.locations = classify_locations(response.pitches, &ticket.pitch_type);

                let (whiffs, hits_in_play, other) = count_categories(&self.locations);
                debug!(
                    pitcher_id = ticket.pitcher_id,
                    pitch_type = %ticket.pitch_type,
                    whiffs,
                    hits_in_play,
                    other,
                    "Locations committed"
                );
                self.event_bus.emit_lossy(ViewEvent::LocationsUpdated {
                    pitcher_id: ticket.pitcher_id,
                    pitch_type: ticket.pitch_type,
                    whiffs,
                    hits_in_play,
                    other,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(
                    pitcher_id = ticket.pitcher_id,
                    error = %e,
                    "Location fetch failed; clearing classified set"
                );
                self.locations.clear();
                self.zone = None;
            }
        }
    }

    /// Issue and apply one location resolution for the live state.
    pub async fn refresh_locations(&mut self) {
        let Some(ticket) = self.begin_locations() else {
            return;
        };
        let result = self
            .api
            .pitcher_pitches(ticket.pitcher_id, ticket.situation)
            .await;
        self.complete_locations(ticket, result);
    }
}
