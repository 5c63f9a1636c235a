//! The deal-set driver: per-board retries around the builder, adaptive
//! re-seeding when a board drags, and the vulnerability/rotation
//! enrichment pass over the finished set.

use crate::builder::{build_board, GenerationObserver};
use crate::config::GeneratorConfig;
use crate::error::DealGenerationError;
use crate::matcher::{match_seat, RsChoices};
use crate::profile::HandProfile;
use crate::selector::choose_index_for_seat;
use dealer_core::{deck, Deal, Hand, Seat, Vulnerability};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};

/// Run-setup record handed in from the outside. The generation core
/// reads only `seed`; the path fields are opaque and forwarded to the
/// renderers.
#[derive(Debug, Clone)]
pub struct Setup {
    pub seed: u64,
    pub output_txt_path: Option<PathBuf>,
    pub output_lin_path: Option<PathBuf>,
    pub owner: String,
    pub profile_name: String,
    pub timestamp: String,
}

/// A finished run: the deals plus per-board wall times and how many
/// adaptive re-seeds were needed.
#[derive(Debug, Clone)]
pub struct DealSet {
    pub deals: Vec<Deal>,
    pub board_times: Vec<f64>,
    pub reseed_count: u32,
}

/// Generate a full deal set for a validated profile.
///
/// Each board gets up to `max_board_retries` builder invocations against
/// the same advancing RNG. When a board's wall clock crosses the re-seed
/// threshold, the RNG is replaced from OS entropy to escape an
/// unfavourable trajectory (deliberately breaking reproducibility; set
/// the threshold to 0.0 to keep the run a pure function of the seed).
pub fn generate_deals(
    profile: &HandProfile,
    num_deals: u32,
    rotate: bool,
    seed: u64,
    config: &GeneratorConfig,
    observer: &mut dyn GenerationObserver,
) -> Result<DealSet, DealGenerationError> {
    if num_deals == 0 {
        return Err(DealGenerationError::new("num_deals must be positive, got 0."));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    if profile.use_rs_w_only_path {
        let mut deals = Vec::with_capacity(num_deals as usize);
        for board_number in 1..=num_deals {
            deals.push(build_board_rs_w_only(&mut rng, profile, board_number, config)?);
        }
        apply_vulnerability_and_rotation(&mut rng, &mut deals, rotate, config.rotate_probability);
        return Ok(DealSet { deals, board_times: Vec::new(), reseed_count: 0 });
    }

    let mut deals = Vec::with_capacity(num_deals as usize);
    let mut board_times = Vec::with_capacity(num_deals as usize);
    let mut reseed_count = 0u32;

    for board_number in 1..=num_deals {
        let mut board_start = Instant::now();
        let mut deal = None;
        let mut last_err: Option<DealGenerationError> = None;

        for _retry in 0..config.max_board_retries {
            match build_board(&mut rng, profile, board_number, config, observer) {
                Ok(d) => {
                    deal = Some(d);
                    break;
                }
                Err(err) => {
                    last_err = Some(err);
                    // Adaptive re-seeding: a board still running past the
                    // threshold is probably on a bad trajectory. Swap in
                    // fresh OS entropy and restart its clock.
                    if config.reseed_threshold_secs > 0.0 {
                        let elapsed = board_start.elapsed().as_secs_f64();
                        if elapsed >= config.reseed_threshold_secs {
                            rng = StdRng::from_entropy();
                            reseed_count += 1;
                            board_start = Instant::now();
                            warn!(board_number, reseed_count, "adaptive re-seed");
                        }
                    }
                }
            }
        }

        board_times.push(board_start.elapsed().as_secs_f64());

        match deal {
            Some(d) => {
                debug!(board_number, "board complete");
                deals.push(d);
            }
            None => {
                let cause = last_err
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no builder error recorded".to_string());
                return Err(DealGenerationError::new(format!(
                    "Failed to generate board {} after {} retries of {} attempts each. \
                     Last cause: {}",
                    board_number, config.max_board_retries, config.max_board_attempts, cause,
                )));
            }
        }
    }

    apply_vulnerability_and_rotation(&mut rng, &mut deals, rotate, config.rotate_probability);

    Ok(DealSet { deals, board_times, reseed_count })
}

/// Convenience wrapper over a setup record; rotation follows the
/// profile's own default.
pub fn generate_deals_for_setup(
    setup: &Setup,
    profile: &HandProfile,
    num_deals: u32,
    config: &GeneratorConfig,
    observer: &mut dyn GenerationObserver,
) -> Result<DealSet, DealGenerationError> {
    generate_deals(
        profile,
        num_deals,
        profile.rotate_by_default,
        setup.seed,
        config,
        observer,
    )
}

/// Lightweight path for profiles flagged `use_rs_w_only_path`: plain
/// shuffled slices with only West's Random Suit constraint enforced.
fn build_board_rs_w_only<R: Rng>(
    rng: &mut R,
    profile: &HandProfile,
    board_number: u32,
    config: &GeneratorConfig,
) -> Result<Deal, DealGenerationError> {
    let Some(west_sp) = profile.seat_profile(Seat::West) else {
        return Err(DealGenerationError::new(
            "use_rs_w_only_path requires a constrained West seat.",
        ));
    };

    let mut attempts = 0u32;
    while attempts < config.max_board_attempts {
        attempts += 1;

        let mut cards = deck::build();
        cards.shuffle(rng);

        let mut hands: HashMap<Seat, Vec<dealer_core::Card>> = HashMap::with_capacity(4);
        for (i, seat) in profile.dealing_order.iter().enumerate() {
            hands.insert(*seat, cards[i * 13..(i + 1) * 13].to_vec());
        }

        let idx = choose_index_for_seat(rng, west_sp);
        let sub = &west_sp.subprofiles[idx];

        let outcome = match_seat(
            profile,
            Seat::West,
            &hands[&Seat::West],
            sub,
            idx + 1,
            &RsChoices::default(),
            None,
            rng,
        );

        if outcome.matched {
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
    }

    Err(DealGenerationError::new(format!(
        "Failed to construct Random-Suit-W-only board for board {} after {} attempts.",
        board_number, config.max_board_attempts,
    )))
}

/// Post-processing enrichment: re-key vulnerabilities from a random
/// starting offset, then swap each deal's N/S and E/W seats with the
/// given probability when rotation is enabled.
fn apply_vulnerability_and_rotation<R: Rng>(
    rng: &mut R,
    deals: &mut [Deal],
    rotate: bool,
    rotate_probability: f64,
) {
    if deals.is_empty() {
        return;
    }

    let start = rng.gen_range(0..Vulnerability::CYCLE.len());
    for (i, deal) in deals.iter_mut().enumerate() {
        deal.vulnerability = Vulnerability::CYCLE[(start + i) % Vulnerability::CYCLE.len()];
        if rotate && rng.gen::<f64>() < rotate_probability {
            deal.rotate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NoopObserver;
    use crate::profile::{
        ExtraConstraint, RandomSuitConstraint, SeatProfile, StandardConstraints, SubProfile,
        SuitRange,
    };
    use dealer_core::Suit;

    fn base_profile() -> HandProfile {
        let mut seat_profiles = HashMap::new();
        for seat in Seat::ALL {
            seat_profiles.insert(
                seat,
                SeatProfile::new(vec![SubProfile::standard_only(StandardConstraints::wide_open())]),
            );
        }
        HandProfile {
            profile_name: "driver-test".into(),
            dealer: Seat::North,
            dealing_order: Seat::ALL,
            tag: Default::default(),
            seat_profiles,
            subprofile_exclusions: vec![],
            author: String::new(),
            version: 1,
            rotate_by_default: false,
            ns_role_mode: Default::default(),
            ew_role_mode: Default::default(),
            is_invariants_safety_profile: false,
            use_rs_w_only_path: false,
        }
    }

    #[test]
    fn test_zero_deals_rejected() {
        let profile = base_profile();
        let config = GeneratorConfig::reproducible();
        let err = generate_deals(&profile, 0, false, 1, &config, &mut NoopObserver).unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn test_vulnerability_is_cyclic_with_period_four() {
        let profile = base_profile();
        let config = GeneratorConfig::reproducible();
        let set = generate_deals(&profile, 12, false, 42, &config, &mut NoopObserver).unwrap();

        assert_eq!(set.deals.len(), 12);
        assert_eq!(set.board_times.len(), 12);
        assert_eq!(set.reseed_count, 0);

        let cycle = Vulnerability::CYCLE;
        let pos = |v: Vulnerability| cycle.iter().position(|c| *c == v).unwrap();
        for pair in set.deals.windows(2) {
            assert_eq!(
                pos(pair[1].vulnerability),
                (pos(pair[0].vulnerability) + 1) % 4
            );
        }
    }

    #[test]
    fn test_same_seed_reproduces_deal_set() {
        let profile = base_profile();
        let config = GeneratorConfig::reproducible();
        let a = generate_deals(&profile, 6, true, 99, &config, &mut NoopObserver).unwrap();
        let b = generate_deals(&profile, 6, true, 99, &config, &mut NoopObserver).unwrap();
        for (da, db) in a.deals.iter().zip(&b.deals) {
            assert_eq!(da.dealer, db.dealer);
            assert_eq!(da.vulnerability, db.vulnerability);
            for seat in Seat::ALL {
                assert_eq!(da.hands[&seat], db.hands[&seat]);
            }
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let profile = base_profile();
        let config = GeneratorConfig::reproducible();
        let a = generate_deals(&profile, 1, false, 1, &config, &mut NoopObserver).unwrap();
        let b = generate_deals(&profile, 1, false, 2, &config, &mut NoopObserver).unwrap();
        assert_ne!(a.deals[0].hands[&Seat::North], b.deals[0].hands[&Seat::North]);
    }

    #[test]
    fn test_rotation_swaps_constrained_hand_between_ns() {
        // North must hold exactly 6 spades. With rotation on, the
        // 6-spade hand lands on N or S per deal; vulnerability is
        // untouched by the swap.
        let mut profile = base_profile();
        let mut north = SubProfile::standard_only(StandardConstraints::wide_open());
        north.standard.spades = SuitRange::new(6, 6, 0, 10).unwrap();
        profile
            .seat_profiles
            .insert(Seat::North, SeatProfile::new(vec![north]));

        let config = GeneratorConfig::reproducible();
        let set = generate_deals(&profile, 24, true, 7, &config, &mut NoopObserver).unwrap();

        let mut north_count = 0;
        let mut south_count = 0;
        for deal in &set.deals {
            let n = deal.hands[&Seat::North].length(Suit::Spades);
            let s = deal.hands[&Seat::South].length(Suit::Spades);
            if n == 6 {
                north_count += 1;
            } else if s == 6 {
                south_count += 1;
            } else {
                panic!("six-spade hand lost in rotation");
            }
        }
        assert_eq!(north_count + south_count, 24);
        // With p=0.5 over 24 deals, both orientations appear.
        assert!(north_count > 0 && south_count > 0);
    }

    #[test]
    fn test_rs_west_pc_east_agree() {
        // West: one of {S, H} with >= 5 cards. East: >= 1 card of West's
        // chosen suit. Checked pre-rotation (rotate = false).
        let mut profile = base_profile();

        let mut west = SubProfile::standard_only(StandardConstraints::wide_open());
        west.extra = Some(ExtraConstraint::RandomSuit(RandomSuitConstraint {
            allowed_suits: vec![Suit::Spades, Suit::Hearts],
            required_suits_count: 1,
            suit_ranges: vec![SuitRange::new(5, 13, 0, 10).unwrap()],
            pair_overrides: vec![],
        }));
        profile
            .seat_profiles
            .insert(Seat::West, SeatProfile::new(vec![west]));

        let mut east = SubProfile::standard_only(StandardConstraints::wide_open());
        east.extra = Some(ExtraConstraint::PartnerContingent(
            crate::profile::ContingentConstraint {
                seat: Seat::West,
                suit_range: SuitRange::new(1, 13, 0, 10).unwrap(),
                use_non_chosen_suit: false,
            },
        ));
        profile
            .seat_profiles
            .insert(Seat::East, SeatProfile::new(vec![east]));

        let config = GeneratorConfig::reproducible();
        let set = generate_deals(&profile, 8, false, 31, &config, &mut NoopObserver).unwrap();

        assert_eq!(set.deals.len(), 8);
        for deal in &set.deals {
            let west_hand = &deal.hands[&Seat::West];
            let east_hand = &deal.hands[&Seat::East];
            let agreed = [Suit::Spades, Suit::Hearts].iter().any(|&suit| {
                west_hand.length(suit) >= 5 && east_hand.length(suit) >= 1
            });
            assert!(agreed, "no agreed major between W and E");
        }
    }

    #[test]
    fn test_rs_w_only_path_enforces_west_only() {
        let mut profile = base_profile();
        profile.use_rs_w_only_path = true;
        let mut west = SubProfile::standard_only(StandardConstraints::wide_open());
        west.extra = Some(ExtraConstraint::RandomSuit(RandomSuitConstraint {
            allowed_suits: vec![Suit::Clubs, Suit::Diamonds],
            required_suits_count: 1,
            suit_ranges: vec![SuitRange::new(6, 13, 0, 10).unwrap()],
            pair_overrides: vec![],
        }));
        profile
            .seat_profiles
            .insert(Seat::West, SeatProfile::new(vec![west]));

        let config = GeneratorConfig::reproducible();
        let set = generate_deals(&profile, 4, false, 13, &config, &mut NoopObserver).unwrap();
        assert_eq!(set.deals.len(), 4);
        for deal in &set.deals {
            let west_hand = &deal.hands[&Seat::West];
            assert!(
                west_hand.length(Suit::Clubs) >= 6 || west_hand.length(Suit::Diamonds) >= 6,
                "west lacks a six-card minor"
            );
        }
    }

    #[test]
    fn test_exhaustion_returns_error_without_partial_set() {
        // Unviable North: the builder terminates every retry, and the
        // driver surfaces an error instead of a partial deal set.
        let mut profile = base_profile();
        let mut sub = SubProfile::standard_only(StandardConstraints::wide_open());
        sub.standard.spades = SuitRange::new(13, 13, 0, 10).unwrap();
        sub.standard.hearts = SuitRange::new(1, 13, 0, 10).unwrap();
        profile
            .seat_profiles
            .insert(Seat::North, SeatProfile::new(vec![sub]));

        let mut config = GeneratorConfig::reproducible();
        config.max_board_retries = 2;
        let err = generate_deals(&profile, 3, false, 1, &config, &mut NoopObserver).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("board 1"), "message was: {}", msg);
        assert!(msg.contains("unviable"), "message was: {}", msg);
    }
}
