//! The per-board attempt loop: select subprofiles, pre-select RS suits,
//! deal with shape help, match seats in processing order, and retry with
//! periodic re-rolls until a valid deal emerges or the budget exhausts.

use crate::config::GeneratorConfig;
use crate::error::DealGenerationError;
use crate::feasibility::{is_unviable_bucket, viability_summary, SeatViabilitySummary};
use crate::matcher::{match_seat, FailReason, RsChoice, RsChoices};
use crate::profile::HandProfile;
use crate::selector::{select_subprofiles, Selection};
use crate::shape_help::{
    compute_dealing_order, deal_with_help, dispersion_check, pre_select_rs_suits,
    processing_order,
};
use dealer_core::{deck, Card, Deal, Hand, Seat, Suit, Vulnerability};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Per-board failure attribution, updated on every failing attempt.
#[derive(Debug, Clone, Default)]
pub struct FailureCounters {
    /// Seat was the first to fail on an attempt.
    pub as_seat: HashMap<Seat, u32>,
    /// Seat passed this attempt but a later seat failed.
    pub global_other: HashMap<Seat, u32>,
    /// Seat was never reached because an earlier seat failed.
    pub global_unchecked: HashMap<Seat, u32>,
    /// First-failure cause classified HCP.
    pub hcp: HashMap<Seat, u32>,
    /// First-failure cause classified shape.
    pub shape: HashMap<Seat, u32>,
    /// Raw per-seat failures and match attempts.
    pub fail_counts: HashMap<Seat, u32>,
    pub seen_counts: HashMap<Seat, u32>,
}

fn bump(map: &mut HashMap<Seat, u32>, seat: Seat) {
    *map.entry(seat).or_insert(0) += 1;
}

/// Diagnostic callbacks threaded through the builder. All methods have
/// no-op defaults; implementations must never affect generation.
pub trait GenerationObserver {
    fn on_attempt_attribution(
        &mut self,
        _board_number: u32,
        _attempt: u32,
        _counters: &FailureCounters,
    ) {
    }

    fn on_max_attempts(
        &mut self,
        _board_number: u32,
        _attempts: u32,
        _chosen_indices: &HashMap<Seat, usize>,
        _summary: &HashMap<Seat, SeatViabilitySummary>,
    ) {
    }

    fn on_shape_help(&mut self, _board_number: u32, _attempt: u32, _tight_seats: &HashSet<Seat>) {}
}

/// The default observer: does nothing.
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}

struct AttemptPlan {
    selection: Selection,
    dealing_order: [Seat; 4],
    rs_pre: HashMap<Seat, Vec<Suit>>,
    tight: HashSet<Seat>,
    processing: Vec<Seat>,
}

fn plan_attempt<R: Rng>(
    rng: &mut R,
    profile: &HandProfile,
    config: &GeneratorConfig,
) -> AttemptPlan {
    let selection = select_subprofiles(rng, profile, config.subprofile_feasibility_retries);
    let dealing_order = compute_dealing_order(&selection.subprofiles, profile.dealer);
    let rs_pre = pre_select_rs_suits(rng, &selection.subprofiles);
    let tight = dispersion_check(&selection.subprofiles, &rs_pre, config.shape_prob_threshold);
    let processing = processing_order(profile, &dealing_order, &selection.subprofiles);
    AttemptPlan { selection, dealing_order, rs_pre, tight, processing }
}

/// Build one constrained deal, or fail with exhaustion or an unviable
/// determination.
pub fn build_board<R: Rng>(
    rng: &mut R,
    profile: &HandProfile,
    board_number: u32,
    config: &GeneratorConfig,
    observer: &mut dyn GenerationObserver,
) -> Result<Deal, DealGenerationError> {
    // Invariants-safety profiles skip all constraints: shuffle, slice,
    // tag. Exists so deal invariants can be smoke-tested end to end.
    if profile.is_invariants_safety_profile {
        let mut cards = deck::build();
        cards.shuffle(rng);
        let mut hands = HashMap::with_capacity(4);
        for (i, seat) in profile.dealing_order.iter().enumerate() {
            hands.insert(*seat, Hand::new(cards[i * 13..(i + 1) * 13].to_vec()));
        }
        return Ok(Deal {
            board_number,
            dealer: profile.dealer,
            vulnerability: Vulnerability::for_board(board_number),
            hands,
        });
    }

    let mut plan = plan_attempt(rng, profile, config);
    let mut counters = FailureCounters::default();

    let mut attempt = 0u32;
    while attempt < config.max_board_attempts {
        attempt += 1;

        // Periodic re-rolls. Subprofile re-selection also refreshes RS
        // pre-selections and both orders, since the constraint mix may
        // have changed; the more frequent RS-only re-roll escapes a bad
        // suit choice within the same subprofile combination.
        if attempt > 1
            && config.subprofile_reroll_interval > 0
            && (attempt - 1) % config.subprofile_reroll_interval == 0
        {
            plan = plan_attempt(rng, profile, config);
        } else if attempt > 1
            && config.rs_reroll_interval > 0
            && (attempt - 1) % config.rs_reroll_interval == 0
        {
            plan.rs_pre = pre_select_rs_suits(rng, &plan.selection.subprofiles);
            plan.tight = dispersion_check(
                &plan.selection.subprofiles,
                &plan.rs_pre,
                config.shape_prob_threshold,
            );
        }

        // Hopeless-profile early termination, once enough evidence has
        // accumulated.
        if attempt >= config.min_attempts_for_unviable {
            let mut unviable: Vec<Seat> = Vec::new();
            for seat in Seat::ALL {
                let attempts = counters.seen_counts.get(&seat).copied().unwrap_or(0);
                let failures = counters.fail_counts.get(&seat).copied().unwrap_or(0);
                let successes = attempts.saturating_sub(failures);
                if is_unviable_bucket(successes, attempts, failures) {
                    unviable.push(seat);
                }
            }
            if !unviable.is_empty() {
                let seats: String = unviable.iter().map(|s| s.to_char()).collect();
                debug!(board_number, attempt, seats = %seats, "profile unviable");
                observer.on_max_attempts(
                    board_number,
                    attempt,
                    &plan.selection.indices,
                    &viability_summary(&counters.fail_counts, &counters.seen_counts),
                );
                return Err(DealGenerationError::new(format!(
                    "Profile declared unviable for board {} after {} attempts. \
                     Unviable seat(s): {}. These seats fail at least 90% of \
                     attempts with sufficient data.",
                    board_number, attempt, seats,
                )));
            }
        }

        if !plan.tight.is_empty() && attempt == 1 {
            observer.on_shape_help(board_number, attempt, &plan.tight);
        }

        let mut cards = deck::build();
        cards.shuffle(rng);

        let hands = match deal_with_help(
            rng,
            &mut cards,
            &plan.selection.subprofiles,
            &plan.tight,
            &plan.dealing_order,
            &plan.rs_pre,
            config,
        ) {
            Ok(hands) => hands,
            Err(rejected_seat) => {
                // The HCP gate attributed this attempt before any
                // matching ran.
                bump(&mut counters.as_seat, rejected_seat);
                bump(&mut counters.hcp, rejected_seat);
                bump(&mut counters.fail_counts, rejected_seat);
                bump(&mut counters.seen_counts, rejected_seat);
                for seat in &plan.processing {
                    if *seat != rejected_seat {
                        bump(&mut counters.global_unchecked, *seat);
                    }
                }
                observer.on_attempt_attribution(board_number, attempt, &counters);
                continue;
            }
        };

        // Seed shared RS choices from the pre-selections so matching
        // uses the committed suits and PC/OC seats see them at once.
        let mut rs_choices = RsChoices::default();
        for seat in Seat::ALL {
            let Some(suits) = plan.rs_pre.get(&seat) else {
                continue;
            };
            let Some(rs) = plan
                .selection
                .subprofiles
                .get(&seat)
                .and_then(|sub| sub.random_suit())
            else {
                continue;
            };
            rs_choices.set(
                seat,
                RsChoice { chosen: suits.clone(), allowed: rs.allowed_suits.clone() },
            );
        }

        let mut checked: Vec<Seat> = Vec::with_capacity(4);
        let mut first_failed: Option<(Seat, usize)> = None;

        for &seat in &plan.processing {
            let (Some(sub), Some(&idx)) = (
                plan.selection.subprofiles.get(&seat),
                plan.selection.indices.get(&seat),
            ) else {
                continue;
            };
            let hand: &[Card] = &hands[&seat];

            // Cheap total-HCP pre-check before the full matcher. The
            // attribution is always "hcp" here even if the hand would
            // also fail shape; HCP is the detected cause.
            let quick_hcp: u8 = hand.iter().map(|c| c.hcp()).sum();
            if !sub.standard.total_hcp_ok(quick_hcp) {
                checked.push(seat);
                bump(&mut counters.seen_counts, seat);
                bump(&mut counters.fail_counts, seat);
                bump(&mut counters.as_seat, seat);
                bump(&mut counters.hcp, seat);
                first_failed = Some((seat, checked.len() - 1));
                break;
            }

            checked.push(seat);
            bump(&mut counters.seen_counts, seat);

            let outcome = match_seat(
                profile,
                seat,
                hand,
                sub,
                idx + 1,
                &rs_choices,
                plan.rs_pre.get(&seat).map(|v| v.as_slice()),
                rng,
            );

            if outcome.matched {
                if let (Some(chosen), Some(rs)) = (&outcome.chosen_rs, sub.random_suit()) {
                    rs_choices.set(
                        seat,
                        RsChoice { chosen: chosen.clone(), allowed: rs.allowed_suits.clone() },
                    );
                }
                continue;
            }

            bump(&mut counters.fail_counts, seat);
            bump(&mut counters.as_seat, seat);
            match outcome.fail {
                Some(FailReason::Hcp) => bump(&mut counters.hcp, seat),
                Some(FailReason::Shape) => bump(&mut counters.shape, seat),
                _ => {}
            }
            first_failed = Some((seat, checked.len() - 1));
            break;
        }

        match first_failed {
            None => {
                let hands = hands
                    .into_iter()
                    .map(|(seat, cards)| (seat, Hand::new(cards)))
                    .collect();
                return Ok(Deal {
                    board_number,
                    dealer: profile.dealer,
                    vulnerability: Vulnerability::for_board(board_number),
                    hands,
                });
            }
            Some((_seat, failed_idx)) => {
                for seat in &checked[..failed_idx] {
                    bump(&mut counters.global_other, *seat);
                }
                let checked_set: HashSet<Seat> = checked.iter().copied().collect();
                for seat in &plan.processing {
                    if !checked_set.contains(seat) {
                        bump(&mut counters.global_unchecked, *seat);
                    }
                }
                observer.on_attempt_attribution(board_number, attempt, &counters);
            }
        }
    }

    observer.on_max_attempts(
        board_number,
        attempt,
        &plan.selection.indices,
        &viability_summary(&counters.fail_counts, &counters.seen_counts),
    );
    Err(DealGenerationError::new(format!(
        "Failed to construct constrained deal for board {} after {} attempts.",
        board_number, config.max_board_attempts,
    )))
}
