//! Integration tests for the view session resolver cascade
//!
//! Drives ViewSession with a fake API implementation that records call
//! counts, so trigger scoping (what re-fetches on which input change), the
//! staleness guard, and the classification pipeline can be verified without
//! a network.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use pitchmix_common::events::{EventBus, ViewEvent};
use pitchmix_common::types::{
    Hand, HistoricalOutcomes, Pitcher, PitchPoint, Recommendation, Situation, UsageByCount,
    UsageEntry,
};
use pitchmix_view::zone::{ZoneBounds, ZONE_BOT_FALLBACK, ZONE_TOP_FALLBACK};
use pitchmix_view::{ClientError, PitchMixApi, PitchesResponse, RosterState, ViewSession};

// ----------------------------------------------------------------------
// Fake API
// ----------------------------------------------------------------------

struct FakeApi {
    pitchers: Vec<Pitcher>,
    usage: Mutex<UsageByCount>,
    recommendation: Mutex<Recommendation>,
    pitches: Mutex<Vec<PitchPoint>>,
    avg_sz_top: Mutex<Option<f64>>,
    avg_sz_bot: Mutex<Option<f64>>,

    roster_calls: AtomicUsize,
    usage_calls: AtomicUsize,
    recommend_calls: AtomicUsize,
    pitch_calls: AtomicUsize,

    fail_roster: AtomicBool,
    fail_usage: AtomicBool,
    fail_recommend: AtomicBool,
    fail_pitches: AtomicBool,
}

impl FakeApi {
    fn new(recommended_pitch_type: &str) -> Self {
        let mut usage = UsageByCount::new();
        usage.insert(
            "1-2".to_string(),
            vec![UsageEntry {
                pitch_type: recommended_pitch_type.to_string(),
                total: 25,
                whiff_pct: 0.4,
                hard_hit_pct: 0.1,
            }],
        );

        Self {
            pitchers: vec![
                Pitcher {
                    id: 42,
                    name: "Test Pitcher".to_string(),
                    throws_hand: Hand::R,
                },
                Pitcher {
                    id: 7,
                    name: "Other Pitcher".to_string(),
                    throws_hand: Hand::L,
                },
            ],
            usage: Mutex::new(usage),
            recommendation: Mutex::new(recommendation(recommended_pitch_type)),
            pitches: Mutex::new(Vec::new()),
            avg_sz_top: Mutex::new(Some(3.4)),
            avg_sz_bot: Mutex::new(Some(1.6)),
            roster_calls: AtomicUsize::new(0),
            usage_calls: AtomicUsize::new(0),
            recommend_calls: AtomicUsize::new(0),
            pitch_calls: AtomicUsize::new(0),
            fail_roster: AtomicBool::new(false),
            fail_usage: AtomicBool::new(false),
            fail_recommend: AtomicBool::new(false),
            fail_pitches: AtomicBool::new(false),
        }
    }

    fn set_pitches(&self, pitches: Vec<PitchPoint>) {
        *self.pitches.lock().unwrap() = pitches;
    }

    fn set_zone_averages(&self, top: Option<f64>, bot: Option<f64>) {
        *self.avg_sz_top.lock().unwrap() = top;
        *self.avg_sz_bot.lock().unwrap() = bot;
    }
}

impl PitchMixApi for FakeApi {
    async fn health(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn list_pitchers(&self) -> Result<Vec<Pitcher>, ClientError> {
        self.roster_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_roster.load(Ordering::SeqCst) {
            return Err(ClientError::Network("connection refused".to_string()));
        }
        Ok(self.pitchers.clone())
    }

    async fn pitcher_usage(
        &self,
        _pitcher_id: i64,
        _batter_hand: Hand,
    ) -> Result<UsageByCount, ClientError> {
        self.usage_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_usage.load(Ordering::SeqCst) {
            return Err(ClientError::Api(500, "boom".to_string()));
        }
        Ok(self.usage.lock().unwrap().clone())
    }

    async fn recommend(
        &self,
        _pitcher_id: i64,
        _situation: Situation,
    ) -> Result<Recommendation, ClientError> {
        self.recommend_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_recommend.load(Ordering::SeqCst) {
            return Err(ClientError::Api(503, "unavailable".to_string()));
        }
        Ok(self.recommendation.lock().unwrap().clone())
    }

    async fn pitcher_pitches(
        &self,
        pitcher_id: i64,
        situation: Situation,
    ) -> Result<PitchesResponse, ClientError> {
        self.pitch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pitches.load(Ordering::SeqCst) {
            return Err(ClientError::Network("timed out".to_string()));
        }
        Ok(PitchesResponse {
            pitcher_id,
            balls: situation.balls,
            strikes: situation.strikes,
            batter_hand: Some(situation.batter_hand),
            avg_sz_top: *self.avg_sz_top.lock().unwrap(),
            avg_sz_bot: *self.avg_sz_bot.lock().unwrap(),
            pitches: self.pitches.lock().unwrap().clone(),
        })
    }
}

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

fn recommendation(pitch_type: &str) -> Recommendation {
    Recommendation {
        recommended_pitch_type: pitch_type.to_string(),
        confidence: 0.72,
        rationale: vec!["historical whiff edge".to_string()],
        historical_outcomes: HistoricalOutcomes {
            sample_size: 25,
            whiff_pct: 0.4,
            in_play_hard_hit_pct: 0.1,
        },
    }
}

fn pitch(
    plate_x: f64,
    plate_z: f64,
    pitch_type: &str,
    description: Option<&str>,
    outcome: Option<&str>,
) -> PitchPoint {
    PitchPoint {
        plate_x,
        plate_z,
        pitch_type: Some(pitch_type.to_string()),
        description: description.map(str::to_string),
        outcome: outcome.map(str::to_string),
    }
}

/// Session with roster loaded and pitcher 42 selected (default 1-2, L)
async fn ready_session(api: FakeApi) -> ViewSession<FakeApi> {
    let mut session = ViewSession::new(api, EventBus::new(64));
    session.load_roster().await.unwrap();
    session.select_pitcher(Some(42)).await.unwrap();
    session
}

// ----------------------------------------------------------------------
// Trigger scoping
// ----------------------------------------------------------------------

#[tokio::test]
async fn count_changes_do_not_refetch_usage() {
    let mut session = ready_session(FakeApi::new("SL")).await;
    assert_eq!(session.api().usage_calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.api().recommend_calls.load(Ordering::SeqCst), 1);

    session.set_balls(3).await.unwrap();
    session.set_strikes(0).await.unwrap();

    // Usage depends only on pitcher + batter hand
    assert_eq!(session.api().usage_calls.load(Ordering::SeqCst), 1);
    // Each count change re-resolved the recommendation
    assert_eq!(session.api().recommend_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn batter_hand_change_refetches_usage_and_recommendation() {
    let mut session = ready_session(FakeApi::new("SL")).await;

    session.set_batter_hand(Hand::R).await.unwrap();

    assert_eq!(session.api().usage_calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.api().recommend_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn setting_same_value_is_a_no_op() {
    let mut session = ready_session(FakeApi::new("SL")).await;

    session.set_balls(1).await.unwrap();
    session.set_batter_hand(Hand::L).await.unwrap();

    assert_eq!(session.api().usage_calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.api().recommend_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn no_pitcher_resolves_usage_empty_without_network_call() {
    let api = FakeApi::new("SL");
    let mut session = ViewSession::new(api, EventBus::new(64));
    session.load_roster().await.unwrap();

    session.refresh_usage().await;

    assert!(session.usage().is_empty());
    assert_eq!(session.api().usage_calls.load(Ordering::SeqCst), 0);
}

// ----------------------------------------------------------------------
// Roster loader
// ----------------------------------------------------------------------

#[tokio::test]
async fn selection_rejected_while_roster_loading() {
    let mut session = ViewSession::new(FakeApi::new("SL"), EventBus::new(64));

    let err = session.select_pitcher(Some(42)).await.unwrap_err();
    assert!(matches!(err, pitchmix_common::Error::InvalidInput(_)));
}

#[tokio::test]
async fn roster_failure_surfaces_and_leaves_collection_empty() {
    let api = FakeApi::new("SL");
    api.fail_roster.store(true, Ordering::SeqCst);
    let mut session = ViewSession::new(api, EventBus::new(64));

    let err = session.load_roster().await.unwrap_err();
    assert!(matches!(err, pitchmix_common::Error::Transport(_)));
    assert!(matches!(session.roster(), RosterState::Failed(_)));
    assert!(session.pitchers().is_empty());

    // No automatic retry happened
    assert_eq!(session.api().roster_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_pitcher_id_is_rejected() {
    let mut session = ready_session(FakeApi::new("SL")).await;

    let err = session.select_pitcher(Some(999)).await.unwrap_err();
    assert!(matches!(err, pitchmix_common::Error::NotFound(_)));
    // Prior selection state is untouched
    assert_eq!(session.selected_pitcher(), Some(42));
}

// ----------------------------------------------------------------------
// Location gating & classification
// ----------------------------------------------------------------------

#[tokio::test]
async fn locations_contain_only_the_recommended_pitch_type() {
    let api = FakeApi::new("SL");
    api.set_pitches(vec![
        pitch(0.0, 2.5, "SL", Some("swinging_strike"), None),
        pitch(0.1, 2.5, "FF", Some("swinging_strike"), None),
        pitch(-0.2, 2.0, "SL", None, Some("single")),
        pitch(0.3, 3.0, "CU", None, Some("double")),
    ]);

    let session = ready_session(api).await;

    let locations = session.locations();
    assert_eq!(locations.len(), 2);
    assert!(locations
        .iter()
        .all(|c| c.point.pitch_type.as_deref() == Some("SL")));
}

#[tokio::test]
async fn out_of_window_points_are_excluded() {
    let api = FakeApi::new("SL");
    api.set_pitches(vec![
        pitch(1.5, 2.5, "SL", Some("swinging_strike"), None),
        pitch(0.5, 2.5, "SL", Some("swinging_strike"), None),
    ]);

    let session = ready_session(api).await;

    assert_eq!(session.locations().len(), 1);
    assert_eq!(session.locations()[0].point.plate_x, 0.5);
}

#[tokio::test]
async fn zone_bounds_come_from_response_averages_with_fallback() {
    let api = FakeApi::new("SL");
    let session = ready_session(api).await;
    assert_eq!(session.zone(), Some(ZoneBounds { top: 3.4, bot: 1.6 }));

    let api = FakeApi::new("SL");
    api.set_zone_averages(None, None);
    let session = ready_session(api).await;
    assert_eq!(
        session.zone(),
        Some(ZoneBounds {
            top: ZONE_TOP_FALLBACK,
            bot: ZONE_BOT_FALLBACK,
        })
    );
}

#[tokio::test]
async fn end_to_end_curveball_scenario() {
    let api = FakeApi::new("CU");
    // 10 events, 6 CU, 2 of them swinging strikes
    api.set_pitches(vec![
        pitch(0.0, 2.0, "CU", Some("swinging_strike"), None),
        pitch(0.1, 2.1, "CU", Some("swinging_strike"), None),
        pitch(0.2, 2.2, "CU", None, Some("single")),
        pitch(0.3, 2.3, "CU", None, Some("home_run")),
        pitch(0.4, 2.4, "CU", Some("called_strike"), None),
        pitch(0.5, 2.5, "CU", Some("ball"), None),
        pitch(0.6, 2.6, "FF", Some("swinging_strike"), None),
        pitch(0.7, 2.7, "FF", None, Some("double")),
        pitch(0.8, 2.8, "SL", None, None),
        pitch(0.9, 2.9, "SL", Some("foul"), None),
    ]);

    let mut session = ViewSession::new(api, EventBus::new(64));
    session.load_roster().await.unwrap();
    session.set_balls(1).await.unwrap();
    session.set_strikes(2).await.unwrap();
    session.set_batter_hand(Hand::L).await.unwrap();
    session.select_pitcher(Some(42)).await.unwrap();

    assert_eq!(
        session
            .recommendation()
            .map(|r| r.recommended_pitch_type.as_str()),
        Some("CU")
    );

    let locations = session.locations();
    assert_eq!(locations.len(), 6);

    let (whiffs, hits_in_play, other) =
        pitchmix_view::classify::count_categories(locations);
    assert_eq!(whiffs, 2);
    assert_eq!(hits_in_play + other, 4);
    assert_eq!(hits_in_play, 2);
    assert_eq!(other, 2);
}

// ----------------------------------------------------------------------
// Staleness guard
// ----------------------------------------------------------------------

#[tokio::test]
async fn superseded_recommendation_response_is_discarded() {
    let mut session = ready_session(FakeApi::new("SL")).await;

    // Two overlapping resolution cycles; the older response arrives last
    let stale = session.begin_recommendation().unwrap();
    let fresh = session.begin_recommendation().unwrap();

    let committed = session
        .complete_recommendation(stale, Ok(recommendation("FF")))
        .unwrap();
    assert!(!committed);
    assert!(session.recommendation().is_none());

    let committed = session
        .complete_recommendation(fresh, Ok(recommendation("CU")))
        .unwrap();
    assert!(committed);
    assert_eq!(
        session
            .recommendation()
            .map(|r| r.recommended_pitch_type.as_str()),
        Some("CU")
    );
}

#[tokio::test]
async fn superseded_location_response_is_discarded() {
    let api = FakeApi::new("SL");
    api.set_pitches(vec![pitch(0.0, 2.5, "SL", Some("swinging_strike"), None)]);
    let mut session = ready_session(api).await;
    assert_eq!(session.locations().len(), 1);

    let stale = session.begin_locations().unwrap();
    let _fresh = session.begin_locations().unwrap();

    let marker = PitchesResponse {
        pitcher_id: 42,
        balls: 1,
        strikes: 2,
        batter_hand: Some(Hand::L),
        avg_sz_top: None,
        avg_sz_bot: None,
        pitches: vec![
            pitch(0.9, 3.9, "SL", None, Some("triple")),
            pitch(0.8, 3.8, "SL", None, None),
        ],
    };
    session.complete_locations(stale, Ok(marker));

    // The stale payload must not have been applied
    assert!(session
        .locations()
        .iter()
        .all(|c| c.point.plate_x != 0.9 && c.point.plate_x != 0.8));
}

#[tokio::test]
async fn beginning_a_recommendation_clears_displayed_state() {
    let api = FakeApi::new("SL");
    api.set_pitches(vec![pitch(0.0, 2.5, "SL", Some("swinging_strike"), None)]);
    let mut session = ready_session(api).await;
    assert!(session.recommendation().is_some());
    assert!(!session.locations().is_empty());

    // While a new request is in flight, nothing stale is displayed
    let _ticket = session.begin_recommendation().unwrap();
    assert!(session.recommendation().is_none());
    assert!(session.locations().is_empty());
    assert!(session.zone().is_none());
}

// ----------------------------------------------------------------------
// Failure degradation & clearing
// ----------------------------------------------------------------------

#[tokio::test]
async fn deselecting_clears_all_derived_state() {
    let api = FakeApi::new("SL");
    api.set_pitches(vec![pitch(0.0, 2.5, "SL", Some("swinging_strike"), None)]);
    let mut session = ready_session(api).await;
    assert!(!session.usage().is_empty());
    assert!(session.recommendation().is_some());
    assert!(!session.locations().is_empty());

    session.select_pitcher(None).await.unwrap();

    assert_eq!(session.selected_pitcher(), None);
    assert!(session.usage().is_empty());
    assert!(session.recommendation().is_none());
    assert!(session.locations().is_empty());
    assert!(session.zone().is_none());
}

#[tokio::test]
async fn usage_failure_clears_to_empty_and_is_not_surfaced() {
    let mut session = ready_session(FakeApi::new("SL")).await;
    assert!(!session.usage().is_empty());

    session.api().fail_usage.store(true, Ordering::SeqCst);
    // Batter hand change re-fetches usage; the failure degrades silently
    session.set_batter_hand(Hand::R).await.unwrap();

    assert!(session.usage().is_empty());
    assert!(session.recommendation().is_some());
}

#[tokio::test]
async fn recommendation_failure_surfaces_and_blocks_location_fetch() {
    let api = FakeApi::new("SL");
    api.fail_recommend.store(true, Ordering::SeqCst);
    let mut session = ViewSession::new(api, EventBus::new(64));
    session.load_roster().await.unwrap();

    let err = session.select_pitcher(Some(42)).await.unwrap_err();
    assert!(matches!(err, pitchmix_common::Error::Transport(_)));
    assert!(session.recommendation().is_none());
    assert!(session.locations().is_empty());
    assert_eq!(session.api().pitch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn location_failure_clears_silently() {
    let api = FakeApi::new("SL");
    api.fail_pitches.store(true, Ordering::SeqCst);
    let mut session = ViewSession::new(api, EventBus::new(64));
    session.load_roster().await.unwrap();

    // The cascade itself succeeds; only the location view degrades
    session.select_pitcher(Some(42)).await.unwrap();

    assert!(session.recommendation().is_some());
    assert!(session.locations().is_empty());
    assert!(session.zone().is_none());
}

// ----------------------------------------------------------------------
// Events
// ----------------------------------------------------------------------

#[tokio::test]
async fn committed_transitions_emit_events_in_order() {
    let api = FakeApi::new("SL");
    api.set_pitches(vec![pitch(0.0, 2.5, "SL", Some("swinging_strike"), None)]);

    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let mut session = ViewSession::new(api, bus);

    session.load_roster().await.unwrap();
    session.select_pitcher(Some(42)).await.unwrap();

    assert!(matches!(rx.try_recv().unwrap(), ViewEvent::RosterLoaded { .. }));
    assert!(matches!(
        rx.try_recv().unwrap(),
        ViewEvent::PitcherSelected {
            pitcher_id: Some(42),
            ..
        }
    ));
    assert!(matches!(rx.try_recv().unwrap(), ViewEvent::UsageUpdated { .. }));
    assert!(matches!(
        rx.try_recv().unwrap(),
        ViewEvent::RecommendationUpdated { .. }
    ));
    match rx.try_recv().unwrap() {
        ViewEvent::LocationsUpdated {
            pitch_type, whiffs, ..
        } => {
            assert_eq!(pitch_type, "SL");
            assert_eq!(whiffs, 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn stale_completion_emits_no_event() {
    let bus = EventBus::new(64);
    let mut session = ViewSession::new(FakeApi::new("SL"), bus.clone());
    session.load_roster().await.unwrap();
    session.select_pitcher(Some(42)).await.unwrap();

    // Fresh subscriber after the setup noise
    let mut rx = bus.subscribe();
    let stale = session.begin_recommendation().unwrap();
    let _fresh = session.begin_recommendation().unwrap();
    session
        .complete_recommendation(stale, Ok(recommendation("FF")))
        .unwrap();

    assert!(rx.try_recv().is_err());
}
