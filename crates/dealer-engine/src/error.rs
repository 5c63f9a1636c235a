use thiserror::Error;

/// Raised when something goes wrong during deal generation: board
/// exhaustion, an unviable profile, or infeasible pre-conditions.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DealGenerationError(pub String);

impl DealGenerationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Raised by profile construction and validation. Never reaches the
/// builder; its precondition is a validated profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid suit range: min_cards {min_cards} > max_cards {max_cards}")]
    InvertedCardRange { min_cards: u8, max_cards: u8 },

    #[error("Invalid suit range: min_hcp {min_hcp} > max_hcp {max_hcp}")]
    InvertedHcpRange { min_hcp: u8, max_hcp: u8 },

    #[error("Invalid total HCP range: min {min} > max {max}")]
    InvertedTotalHcp { min: u8, max: u8 },

    #[error("dealing_order must be a permutation of N, E, S, W")]
    BadDealingOrder,

    #[error("Seat {seat} subprofile weights sum to {sum}, outside [98, 102]")]
    BadWeightSum { seat: char, sum: f64 },

    #[error("Seat {seat} has a negative subprofile weight")]
    NegativeWeight { seat: char },

    #[error("Random suit constraint: {0}")]
    BadRandomSuit(String),

    #[error("Contingent constraint on seat {seat}: {reason}")]
    BadContingent { seat: char, reason: String },

    #[error("Exclusion references seat {seat} subprofile {index}, which does not exist")]
    BadExclusionIndex { seat: char, index: usize },

    #[error("Invalid shape pattern {0:?}: expected 4 digits or wildcards")]
    BadShapePattern(String),

    #[error("Seat {seat} has no viable subprofiles: {reason}")]
    NoViableSubprofile { seat: char, reason: String },
}
