use serde::{Deserialize, Serialize};

/// Tuning knobs for the builder and driver. The defaults are the
/// production values; tests tighten or disable individual knobs
/// (`reseed_threshold_secs: 0.0` restores full reproducibility).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Attempt budget per board-build invocation.
    pub max_board_attempts: u32,
    /// Re-select subprofiles every this many attempts. 0 disables.
    pub subprofile_reroll_interval: u32,
    /// Re-sample RS suit pre-selections every this many attempts. 0 disables.
    pub rs_reroll_interval: u32,
    /// Full builder retries per board in the driver.
    pub max_board_retries: u32,
    /// Per-board wall-clock budget before the RNG is replaced with a
    /// fresh OS-entropy seed. 0.0 disables adaptive re-seeding.
    pub reseed_threshold_secs: f64,
    /// Gate attempts on the statistical HCP feasibility check.
    pub enable_hcp_feasibility: bool,
    /// Width of the HCP feasibility confidence band, in standard deviations.
    pub hcp_feasibility_num_sd: f64,
    /// Fraction of standard suit minima reserved for tight seats.
    pub pre_allocate_fraction: f64,
    /// Fraction of RS suit minima reserved for tight RS seats.
    pub rs_pre_allocate_fraction: f64,
    /// Rejection-sampling budget when HCP-targeting RS pre-allocation.
    /// 0 disables targeting.
    pub rs_pre_allocate_hcp_retries: u32,
    /// Seats whose min-cards probability is at or below this are tight.
    pub shape_prob_threshold: f64,
    /// Attempts before the unviable early-termination check may fire.
    pub min_attempts_for_unviable: u32,
    /// Subprofile re-picks allowed when a selection is cross-seat infeasible.
    pub subprofile_feasibility_retries: u32,
    /// Per-deal probability of the N/S–E/W rotation when rotation is on.
    pub rotate_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_board_attempts: 10_000,
            subprofile_reroll_interval: 1_000,
            rs_reroll_interval: 500,
            max_board_retries: 50,
            reseed_threshold_secs: 1.75,
            enable_hcp_feasibility: true,
            hcp_feasibility_num_sd: 1.0,
            pre_allocate_fraction: 0.75,
            rs_pre_allocate_fraction: 1.0,
            rs_pre_allocate_hcp_retries: 10,
            shape_prob_threshold: 0.19,
            min_attempts_for_unviable: 100,
            subprofile_feasibility_retries: 10,
            rotate_probability: 0.5,
        }
    }
}

impl GeneratorConfig {
    /// Deterministic variant for reproducibility-sensitive callers.
    pub fn reproducible() -> Self {
        Self {
            reseed_threshold_secs: 0.0,
            ..Self::default()
        }
    }
}
