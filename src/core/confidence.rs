/// Confidence attached to bands produced by the detectors.
pub const HEURISTIC_CONFIDENCE: f32 = 0.8;

/// Confidence attached to bands produced by the equal-division fallback.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsOrigin {
    Heuristic,
    Fallback,
}

impl BoundsOrigin {
    pub fn confidence(self) -> f32 {
        match self {
            BoundsOrigin::Heuristic => HEURISTIC_CONFIDENCE,
            BoundsOrigin::Fallback => FALLBACK_CONFIDENCE,
        }
    }
}

/// Bounds at or below the fallback score did not come from detection.
pub fn is_low_trust(confidence: f32) -> bool {
    confidence <= FALLBACK_CONFIDENCE
}
