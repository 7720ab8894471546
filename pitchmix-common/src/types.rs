//! Domain types for the PitchMix viewer
//!
//! These mirror the analytics API wire contract exactly (snake_case JSON
//! fields), so the API client can deserialize responses directly into them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Handedness, used for both a pitcher's throwing hand and the batter's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    L,
    R,
}

impl Hand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hand::L => "L",
            Hand::R => "R",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "L" | "l" => Ok(Hand::L),
            "R" | "r" => Ok(Hand::R),
            other => Err(Error::InvalidInput(format!(
                "Hand must be 'L' or 'R', got '{}'",
                other
            ))),
        }
    }
}

/// A pitcher available for selection
///
/// Immutable once loaded from the roster endpoint; identity key is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pitcher {
    pub id: i64,
    pub name: String,
    pub throws_hand: Hand,
}

/// The user-selected game situation
///
/// Mutated only by direct user action. Derives the count key used to index
/// usage data; never holds out-of-range counts (`new` validates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Situation {
    pub balls: u8,
    pub strikes: u8,
    pub batter_hand: Hand,
}

impl Situation {
    /// Maximum legal ball count in an at-bat state
    pub const MAX_BALLS: u8 = 3;
    /// Maximum legal strike count in an at-bat state
    pub const MAX_STRIKES: u8 = 2;

    pub fn new(balls: u8, strikes: u8, batter_hand: Hand) -> Result<Self> {
        if balls > Self::MAX_BALLS {
            return Err(Error::InvalidInput(format!(
                "balls must be 0-{}, got {}",
                Self::MAX_BALLS,
                balls
            )));
        }
        if strikes > Self::MAX_STRIKES {
            return Err(Error::InvalidInput(format!(
                "strikes must be 0-{}, got {}",
                Self::MAX_STRIKES,
                strikes
            )));
        }
        Ok(Self {
            balls,
            strikes,
            batter_hand,
        })
    }

    /// Derive the count key used to index `UsageByCount`, e.g. "1-2"
    pub fn count_key(&self) -> String {
        format!("{}-{}", self.balls, self.strikes)
    }
}

impl Default for Situation {
    /// Startup default: a 1-2 count against a left-handed batter
    fn default() -> Self {
        Self {
            balls: 1,
            strikes: 2,
            batter_hand: Hand::L,
        }
    }
}

/// Per-pitch-type usage statistics for one count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub pitch_type: String,
    pub total: u64,
    pub whiff_pct: f64,
    pub hard_hit_pct: f64,
}

/// Count key ("balls-strikes") to ordered usage entries
///
/// Keys are present only for counts with observed data; an absent key means
/// "no data", not zero.
pub type UsageByCount = BTreeMap<String, Vec<UsageEntry>>;

/// Historical outcome summary backing a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalOutcomes {
    pub sample_size: u64,
    pub whiff_pct: f64,
    pub in_play_hard_hit_pct: f64,
}

/// A recommended pitch type for one (pitcher, situation) query
///
/// Replaced wholesale on each resolution, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_pitch_type: String,
    pub confidence: f64,
    pub rationale: Vec<String>,
    pub historical_outcomes: HistoricalOutcomes,
}

/// A raw historical pitch location and result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchPoint {
    pub plate_x: f64,
    pub plate_z: f64,
    #[serde(default)]
    pub pitch_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
}

/// Outcome category derived from a pitch event's description/outcome text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeCategory {
    /// Swinging strike or foul tip
    Whiff,
    /// Ball put in play for a hit (single through home run)
    HitInPlay,
    /// Everything else, including events with neither field set
    Other,
}

impl OutcomeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCategory::Whiff => "Whiff",
            OutcomeCategory::HitInPlay => "HitInPlay",
            OutcomeCategory::Other => "Other",
        }
    }
}

/// A pitch event tagged with its derived outcome category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPitchPoint {
    pub point: PitchPoint,
    pub category: OutcomeCategory,
}
