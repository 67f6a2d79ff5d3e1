use serde::{Deserialize, Serialize};

/// Which physical camera supplies the live frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    Rear,
    Front,
}

impl FacingMode {
    /// Constraint string understood by device media layers.
    pub fn as_constraint(self) -> &'static str {
        match self {
            FacingMode::Rear => "environment",
            FacingMode::Front => "user",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            FacingMode::Rear => FacingMode::Front,
            FacingMode::Front => FacingMode::Rear,
        }
    }

    pub fn is_front(self) -> bool {
        matches!(self, FacingMode::Front)
    }
}

impl Default for FacingMode {
    fn default() -> Self {
        FacingMode::Rear
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Closed,
    Opening,
    Active,
}

/// Acquisition parameters for the camera resource. The snap surface is
/// square, so width and height share one ideal edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub square_aspect: bool,
}

pub const IDEAL_EDGE: u32 = 1080;

impl CaptureConstraints {
    pub fn square_hd(facing: FacingMode) -> Self {
        Self {
            facing,
            ideal_width: IDEAL_EDGE,
            ideal_height: IDEAL_EDGE,
            square_aspect: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_maps_to_media_constraints() {
        assert_eq!(FacingMode::Rear.as_constraint(), "environment");
        assert_eq!(FacingMode::Front.as_constraint(), "user");
    }

    #[test]
    fn flip_is_an_involution() {
        assert_eq!(FacingMode::Rear.flipped(), FacingMode::Front);
        assert_eq!(FacingMode::Rear.flipped().flipped(), FacingMode::Rear);
    }
}
