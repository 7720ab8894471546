//! Strike zone geometry and plot window constants
//!
//! These values are part of the external rendering contract: the reference
//! rectangle and the display window must match the service's coordinate
//! system (plate_x/plate_z, feet from plate center) exactly.

/// Strike zone reference rectangle, horizontal bounds
pub const ZONE_LEFT: f64 = -0.83;
pub const ZONE_RIGHT: f64 = 0.83;

/// Vertical fallback band when no per-query averages are available
pub const ZONE_TOP_FALLBACK: f64 = 3.5;
pub const ZONE_BOT_FALLBACK: f64 = 1.5;

/// Rendering window; points outside are dropped entirely, not clamped
pub const PLOT_X_MIN: f64 = -1.2;
pub const PLOT_X_MAX: f64 = 1.2;
pub const PLOT_Z_MIN: f64 = 1.0;
pub const PLOT_Z_MAX: f64 = 4.0;

/// Vertical strike zone bounds for the current location query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBounds {
    pub top: f64,
    pub bot: f64,
}

impl ZoneBounds {
    /// Build from per-query average bounds, falling back to the fixed band
    /// for whichever side is absent
    pub fn from_averages(avg_sz_top: Option<f64>, avg_sz_bot: Option<f64>) -> Self {
        Self {
            top: avg_sz_top.unwrap_or(ZONE_TOP_FALLBACK),
            bot: avg_sz_bot.unwrap_or(ZONE_BOT_FALLBACK),
        }
    }

    pub fn fallback() -> Self {
        Self {
            top: ZONE_TOP_FALLBACK,
            bot: ZONE_BOT_FALLBACK,
        }
    }
}

/// Whether a point falls inside the rendering window
pub fn in_plot_window(plate_x: f64, plate_z: f64) -> bool {
    (PLOT_X_MIN..=PLOT_X_MAX).contains(&plate_x) && (PLOT_Z_MIN..=PLOT_Z_MAX).contains(&plate_z)
}
