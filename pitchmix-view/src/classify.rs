//! Outcome classification for pitch location events
//!
//! Classification is an ordered rule table evaluated top-to-bottom with
//! first-match-wins semantics. The Whiff rule precedes HitInPlay: an event
//! whose text matches both patterns is a Whiff. That precedence is a
//! preserved contract, not an implementation detail.

use pitchmix_common::types::{ClassifiedPitchPoint, OutcomeCategory, PitchPoint};

use crate::zone::in_plot_window;

/// Outcomes counting as a hit in play
const HIT_IN_PLAY_OUTCOMES: [&str; 4] = ["single", "double", "triple", "home_run"];

struct Rule {
    category: OutcomeCategory,
    matches: fn(&PitchPoint) -> bool,
}

/// Ordered rule table; fallthrough is Other
const RULES: &[Rule] = &[
    Rule {
        category: OutcomeCategory::Whiff,
        matches: is_whiff,
    },
    Rule {
        category: OutcomeCategory::HitInPlay,
        matches: is_hit_in_play,
    },
];

fn is_whiff(point: &PitchPoint) -> bool {
    match &point.description {
        Some(description) => {
            let description = description.to_lowercase();
            description.starts_with("swinging_strike") || description == "foul_tip"
        }
        None => false,
    }
}

fn is_hit_in_play(point: &PitchPoint) -> bool {
    match &point.outcome {
        Some(outcome) => {
            let outcome = outcome.to_lowercase();
            HIT_IN_PLAY_OUTCOMES.iter().any(|hit| *hit == outcome)
        }
        None => false,
    }
}

/// Classify a single pitch event
pub fn classify(point: &PitchPoint) -> OutcomeCategory {
    for rule in RULES {
        if (rule.matches)(point) {
            return rule.category;
        }
    }
    OutcomeCategory::Other
}

/// Build the classified location set for a recommended pitch type:
/// 1. keep only events of the recommended pitch type,
/// 2. classify each survivor,
/// 3. keep only points inside the rendering window.
pub fn classify_locations(
    points: Vec<PitchPoint>,
    recommended_pitch_type: &str,
) -> Vec<ClassifiedPitchPoint> {
    points
        .into_iter()
        .filter(|p| p.pitch_type.as_deref() == Some(recommended_pitch_type))
        .map(|p| ClassifiedPitchPoint {
            category: classify(&p),
            point: p,
        })
        .filter(|c| in_plot_window(c.point.plate_x, c.point.plate_z))
        .collect()
}

/// Category tallies over a classified set
pub fn count_categories(points: &[ClassifiedPitchPoint]) -> (usize, usize, usize) {
    let mut whiffs = 0;
    let mut hits_in_play = 0;
    let mut other = 0;
    for p in points {
        match p.category {
            OutcomeCategory::Whiff => whiffs += 1,
            OutcomeCategory::HitInPlay => hits_in_play += 1,
            OutcomeCategory::Other => other += 1,
        }
    }
    (whiffs, hits_in_play, other)
}
