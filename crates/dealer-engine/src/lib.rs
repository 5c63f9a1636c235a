//! Constrained bridge deal generation: a declarative per-seat Hand
//! Profile in, sets of matching boards out.
//!
//! The pipeline per board: select one subprofile per constrained seat
//! (index-coupled across partnerships), pre-select Random Suit choices,
//! reserve cards for statistically tight seats, deal with a constrained
//! fill, then match every seat, retrying with periodic re-rolls until a
//! valid deal emerges or the budget exhausts.

pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod feasibility;
pub mod matcher;
pub mod profile;
pub mod selector;
pub mod shape_help;

pub use builder::{build_board, FailureCounters, GenerationObserver, NoopObserver};
pub use config::GeneratorConfig;
pub use driver::{generate_deals, generate_deals_for_setup, DealSet, Setup};
pub use error::{DealGenerationError, ProfileError};
pub use matcher::{match_seat, FailReason, MatchOutcome, RsChoice, RsChoices, SuitAnalysis};
pub use profile::{
    validate_profile, validate_profile_viability_light, ExtraConstraint, HandProfile, SeatProfile,
    StandardConstraints, SubProfile, SuitRange,
};
pub use selector::{select_subprofiles, Selection};
