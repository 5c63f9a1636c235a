//! Statistical and structural feasibility checks: the HCP gate used by
//! the shape-help dealer, cheap per-subprofile viability, cross-seat
//! viability for subprofile selections, and empirical viability
//! classification for diagnostics.

use crate::profile::SubProfile;
use dealer_core::deck::MAX_HAND_HCP;
use dealer_core::{Seat, Suit};
use serde::Serialize;
use std::collections::HashMap;

/// P(a random 13-card hand holds >= k cards of one named suit), from the
/// hypergeometric distribution X ~ Hyper(N=52, K=13, n=13). Indexed by k.
pub const SHAPE_PROB_GTE: [f64; 14] = [
    1.000,      // 0
    0.987,      // 1
    0.920,      // 2
    0.710,      // 3
    0.430,      // 4
    0.189,      // 5
    0.063,      // 6
    0.021,      // 7
    0.005,      // 8
    0.001,      // 9
    0.0002,     // 10
    0.00002,    // 11
    0.000001,   // 12
    0.00000003, // 13
];

/// Whether a target total-HCP range is still achievable given the cards
/// already committed to a hand and the composition of the remaining deck.
///
/// Uses the hypergeometric mean/variance of the additional HCP with a
/// finite-population correction; rejects only when even the favourable
/// end of the +-num_sd band cannot reach the target.
#[allow(clippy::too_many_arguments)]
pub fn check_hcp_feasibility(
    drawn_hcp: u32,
    cards_remaining: u32,
    deck_size: u32,
    deck_hcp_sum: u32,
    deck_hcp_sum_sq: u32,
    target_min: u8,
    target_max: u8,
    num_sd: f64,
) -> bool {
    // Hand complete, or nothing left to draw from: exact range check.
    if cards_remaining == 0 || deck_size == 0 {
        return u32::from(target_min) <= drawn_hcp && drawn_hcp <= u32::from(target_max);
    }

    let mu = f64::from(deck_hcp_sum) / f64::from(deck_size);
    let sigma_sq = f64::from(deck_hcp_sum_sq) / f64::from(deck_size) - mu * mu;

    let expected_total = f64::from(drawn_hcp) + f64::from(cards_remaining) * mu;

    // Only one card remains in the deck: it will be drawn deterministically.
    let var_additional = if deck_size <= 1 {
        0.0
    } else {
        let fpc = f64::from(deck_size - cards_remaining) / f64::from(deck_size - 1);
        f64::from(cards_remaining) * sigma_sq * fpc
    };
    let sd_additional = var_additional.max(0.0).sqrt();

    let exp_down = expected_total - num_sd * sd_additional;
    let exp_up = expected_total + num_sd * sd_additional;

    if exp_down > f64::from(target_max) {
        return false;
    }
    if exp_up < f64::from(target_min) {
        return false;
    }
    true
}

/// Cheap 'this can never work' rejection that needs no dealing.
pub fn subprofile_is_viable_light(sub: &SubProfile) -> (bool, &'static str) {
    let std = &sub.standard;
    let mins: u32 = Suit::DISPLAY_ORDER
        .iter()
        .map(|s| u32::from(std.suit_range(*s).min_cards))
        .sum();
    let maxs: u32 = Suit::DISPLAY_ORDER
        .iter()
        .map(|s| u32::from(std.suit_range(*s).max_cards))
        .sum();
    if mins > 13 {
        return (false, "standard suit minimums sum past 13");
    }
    if maxs < 13 {
        return (false, "standard suit maximums sum below 13");
    }
    if std.total_min_hcp > MAX_HAND_HCP {
        return (false, "total_min_hcp exceeds 37");
    }
    (true, "ok")
}

/// Whether a full cross-seat subprofile selection can possibly coexist
/// in one 52-card deal: per-suit minimums must fit in 13 cards, combined
/// HCP minimums must fit under 40, and combined maximums must cover 40.
pub fn cross_seat_feasible(chosen: &HashMap<Seat, SubProfile>) -> (bool, String) {
    for suit in Suit::DISPLAY_ORDER {
        let min_sum: u32 = chosen
            .values()
            .map(|sub| u32::from(sub.standard.suit_range(suit).min_cards))
            .sum();
        if min_sum > 13 {
            return (
                false,
                format!("{} minimums across seats sum to {} > 13", suit, min_sum),
            );
        }
    }

    let hcp_min_sum: u32 = chosen
        .values()
        .map(|sub| u32::from(sub.standard.total_min_hcp))
        .sum();
    if hcp_min_sum > 40 {
        return (
            false,
            format!("total HCP minimums sum to {} > 40", hcp_min_sum),
        );
    }

    // Unconstrained seats can absorb up to a full 37-HCP hand each.
    let unconstrained = 4usize.saturating_sub(chosen.len());
    let hcp_max_sum: u32 = chosen
        .values()
        .map(|sub| u32::from(sub.standard.total_max_hcp))
        .sum::<u32>()
        + (unconstrained as u32) * u32::from(MAX_HAND_HCP);
    if hcp_max_sum < 40 {
        return (
            false,
            format!("total HCP maximums sum to {} < 40", hcp_max_sum),
        );
    }

    (true, String::new())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Viability {
    Unknown,
    Unviable,
    Unlikely,
    Likely,
}

/// Classify a constraint bucket's viability from empirical stats.
/// Diagnostic only; does not influence generation.
pub fn classify_viability(successes: u32, attempts: u32) -> Viability {
    if attempts == 0 {
        return Viability::Unknown;
    }
    if successes == 0 {
        if attempts < 10 {
            return Viability::Unknown;
        }
        return Viability::Unviable;
    }
    let rate = f64::from(successes) / f64::from(attempts);
    if rate < 0.1 {
        Viability::Unlikely
    } else {
        Viability::Likely
    }
}

/// The builder's early-termination rule: a seat is hopeless once its
/// empirical success rate is at most 10% with at least 5 failures.
pub fn is_unviable_bucket(successes: u32, attempts: u32, failures: u32) -> bool {
    if attempts == 0 || failures < 5 {
        return false;
    }
    f64::from(successes) / f64::from(attempts) <= 0.1
}

/// Per-seat empirical summary surfaced to the max-attempts observer hook.
#[derive(Debug, Clone, Serialize)]
pub struct SeatViabilitySummary {
    pub attempts: u32,
    pub successes: u32,
    pub failures: u32,
    pub success_rate: f64,
    pub viability: Viability,
}

pub fn viability_summary(
    fail_counts: &HashMap<Seat, u32>,
    seen_counts: &HashMap<Seat, u32>,
) -> HashMap<Seat, SeatViabilitySummary> {
    let mut summary = HashMap::new();
    for (&seat, &attempts) in seen_counts {
        let failures = fail_counts.get(&seat).copied().unwrap_or(0);
        let successes = attempts.saturating_sub(failures);
        let rate = if attempts > 0 {
            f64::from(successes) / f64::from(attempts)
        } else {
            0.0
        };
        summary.insert(
            seat,
            SeatViabilitySummary {
                attempts,
                successes,
                failures,
                success_rate: rate,
                viability: classify_viability(successes, attempts),
            },
        );
    }
    summary
}
