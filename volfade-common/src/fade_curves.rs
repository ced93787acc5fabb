//! Easing curves for volume fades
//!
//! Each curve maps normalized fade progress `t ∈ [0, 1]` onto shaped
//! progress in `[0, 1]`. The fade controller multiplies shaped progress by
//! the volume delta, so every curve must hit both endpoints exactly.

use serde::{Deserialize, Serialize};

/// Fade curve types for volume fades
///
/// Each curve type provides a different perceptual quality:
/// - Linear: Constant rate of change
/// - Bezier: Front-loaded acceleration (approximate ease-in)
/// - Logarithmic: Symmetric ease-in/ease-out (smoothstep), the most
///   natural-sounding for loudness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeCurve {
    /// Linear: f(t) = t
    Linear,

    /// Bezier: f(t) = t / (1 + (1 - t))
    ///
    /// Quadratic-rational approximation of an ease-in.
    Bezier,

    /// Logarithmic (smoothstep): f(t) = t² (3 - 2t)
    Logarithmic,
}

impl FadeCurve {
    /// Shape normalized progress through the fade
    ///
    /// # Arguments
    /// * `t` - Normalized position through fade (0.0 to 1.0, clamped)
    ///
    /// # Returns
    /// Shaped progress (0.0 at the start volume, 1.0 at the target volume)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Bezier => t / (1.0 + (1.0 - t)),
            FadeCurve::Logarithmic => t * t * (3.0 - 2.0 * t),
        }
    }

    /// Parse curve from string (config files, API requests, CLI)
    ///
    /// Accepts the canonical names plus a few aliases:
    /// - 'smoothstep', 's_curve', 'scurve' map to Logarithmic
    /// - 'ease_in', 'ease-in' map to Bezier
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Some(FadeCurve::Linear),
            "bezier" | "ease_in" | "ease-in" => Some(FadeCurve::Bezier),
            "logarithmic" | "smoothstep" | "scurve" | "s_curve" => Some(FadeCurve::Logarithmic),
            _ => None,
        }
    }

    /// Canonical lowercase name (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Bezier => "bezier",
            FadeCurve::Logarithmic => "logarithmic",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::Bezier => "Bezier",
            FadeCurve::Logarithmic => "Logarithmic",
        }
    }

    /// Get all available fade curve variants
    pub fn all_variants() -> &'static [FadeCurve] {
        &[FadeCurve::Linear, FadeCurve::Bezier, FadeCurve::Logarithmic]
    }
}

impl Default for FadeCurve {
    fn default() -> Self {
        FadeCurve::Logarithmic
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
