//! End-to-end scenarios for the deal generation pipeline.

use dealer_core::io::lin;
use dealer_core::{Card, Deal, Hand, Seat, Suit, Vulnerability};
use dealer_engine::builder::{build_board, NoopObserver};
use dealer_engine::config::GeneratorConfig;
use dealer_engine::driver::generate_deals;
use dealer_engine::profile::{
    validate_profile, ExtraConstraint, HandProfile, RandomSuitConstraint, SeatProfile,
    StandardConstraints, SubProfile, SuitRange,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fs;

fn wide_profile() -> HandProfile {
    let mut seat_profiles = HashMap::new();
    for seat in Seat::ALL {
        seat_profiles.insert(
            seat,
            SeatProfile::new(vec![SubProfile::standard_only(StandardConstraints::wide_open())]),
        );
    }
    HandProfile {
        profile_name: "wide".into(),
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

fn assert_deal_invariants(deal: &Deal) {
    let mut all: Vec<Card> = deal.hands.values().flat_map(|h| h.cards.clone()).collect();
    assert_eq!(all.len(), 52);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 52, "duplicate cards in deal");
    for seat in Seat::ALL {
        assert_eq!(deal.hands[&seat].cards.len(), 13);
    }
    let total_hcp: u32 = deal.hands.values().map(|h| u32::from(h.hcp())).sum();
    assert_eq!(total_hcp, 40);
}

#[test]
fn invariants_safety_profile_produces_clean_shuffles() {
    let mut profile = wide_profile();
    profile.is_invariants_safety_profile = true;

    let config = GeneratorConfig::reproducible();
    let set = generate_deals(&profile, 20, false, 12345, &config, &mut NoopObserver).unwrap();

    assert_eq!(set.deals.len(), 20);
    for deal in &set.deals {
        assert_deal_invariants(deal);
        assert!(Seat::ALL.contains(&deal.dealer));
        assert!(Vulnerability::CYCLE.contains(&deal.vulnerability));
    }
}

#[test]
fn deal_set_vulnerabilities_cycle_with_period_four() {
    let profile = wide_profile();
    let config = GeneratorConfig::reproducible();
    let set = generate_deals(&profile, 16, false, 5, &config, &mut NoopObserver).unwrap();

    let pos = |v: Vulnerability| {
        Vulnerability::CYCLE.iter().position(|c| *c == v).unwrap()
    };
    for pair in set.deals.windows(2) {
        assert_eq!(
            pos(pair[1].vulnerability),
            (pos(pair[0].vulnerability) + 1) % 4
        );
    }
}

#[test]
fn tight_shape_profile_holds_over_ten_boards() {
    // North: exactly 6 spades and 10-12 total HCP; everyone else wide.
    let mut profile = wide_profile();
    let mut north = SubProfile::standard_only(StandardConstraints::wide_open());
    north.standard.spades = SuitRange::new(6, 6, 0, 10).unwrap();
    north.standard.total_min_hcp = 10;
    north.standard.total_max_hcp = 12;
    profile
        .seat_profiles
        .insert(Seat::North, SeatProfile::new(vec![north]));

    let config = GeneratorConfig::reproducible();
    let set = generate_deals(&profile, 10, false, 2024, &config, &mut NoopObserver).unwrap();

    assert_eq!(set.deals.len(), 10);
    for deal in &set.deals {
        assert_deal_invariants(deal);
        let north_hand = &deal.hands[&Seat::North];
        assert_eq!(north_hand.length(Suit::Spades), 6);
        let hcp = north_hand.hcp();
        assert!((10..=12).contains(&hcp), "north hcp was {}", hcp);
    }
}

#[test]
fn impossible_profile_raises_unviable_error() {
    let mut profile = wide_profile();
    let mut north = SubProfile::standard_only(StandardConstraints::wide_open());
    north.standard.spades = SuitRange::new(13, 13, 0, 10).unwrap();
    north.standard.hearts = SuitRange::new(1, 13, 0, 10).unwrap();
    profile
        .seat_profiles
        .insert(Seat::North, SeatProfile::new(vec![north]));

    let mut config = GeneratorConfig::reproducible();
    config.max_board_retries = 1;
    let err = generate_deals(&profile, 1, false, 8, &config, &mut NoopObserver).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("unviable"), "message was: {}", msg);
    assert!(msg.contains('N'), "message was: {}", msg);
}

#[test]
fn reproducible_config_is_a_pure_function_of_inputs() {
    let mut profile = wide_profile();
    let mut north = SubProfile::standard_only(StandardConstraints::wide_open());
    north.standard.total_min_hcp = 12;
    north.standard.total_max_hcp = 20;
    profile
        .seat_profiles
        .insert(Seat::North, SeatProfile::new(vec![north]));

    let config = GeneratorConfig::reproducible();
    let a = generate_deals(&profile, 8, true, 555, &config, &mut NoopObserver).unwrap();
    let b = generate_deals(&profile, 8, true, 555, &config, &mut NoopObserver).unwrap();

    assert_eq!(a.reseed_count, 0);
    for (da, db) in a.deals.iter().zip(&b.deals) {
        assert_eq!(da.dealer, db.dealer);
        assert_eq!(da.vulnerability, db.vulnerability);
        for seat in Seat::ALL {
            assert_eq!(da.hands[&seat], db.hands[&seat]);
        }
    }
}

#[test]
fn lin_line_for_board_one_dealer_north() {
    let mut profile = wide_profile();
    profile.is_invariants_safety_profile = true;

    let mut rng = StdRng::seed_from_u64(4);
    let config = GeneratorConfig::default();
    let deal = build_board(&mut rng, &profile, 1, &config, &mut NoopObserver).unwrap();
    assert_eq!(deal.dealer, Seat::North);
    assert_eq!(deal.vulnerability, Vulnerability::None);

    let line = lin::encode_deal_line(&deal);
    assert!(line.starts_with("qx|o1|md|3"), "line was: {}", line);
    assert!(line.ends_with("|sv|0|pg||"), "line was: {}", line);
    assert!(line.contains("|ah|Board 1|"), "line was: {}", line);
}

#[test]
fn yaml_profile_fixture_round_trips_and_generates() {
    let yaml = fs::read_to_string("tests/profiles/weak_two_major.yaml")
        .expect("Failed to read profile fixture");
    let mut profile: HandProfile =
        serde_yaml::from_str(&yaml).expect("Failed to parse profile fixture");
    validate_profile(&mut profile).expect("fixture should validate");

    assert_eq!(profile.profile_name, "Weak Two — One Major");
    assert_eq!(profile.dealer, Seat::West);

    let config = GeneratorConfig::reproducible();
    let set = generate_deals(&profile, 6, false, 321, &config, &mut NoopObserver).unwrap();

    for deal in &set.deals {
        assert_deal_invariants(deal);
        let west = &deal.hands[&Seat::West];
        let east = &deal.hands[&Seat::East];

        // West: a 6-card major with 4+ HCP in it, 5-11 total.
        let chosen = [Suit::Spades, Suit::Hearts]
            .into_iter()
            .find(|&s| west.length(s) == 6 && west.hcp_in(s) >= 4)
            .expect("west lacks the weak-two major");
        assert!((5..=11).contains(&west.hcp()), "west hcp {}", west.hcp());

        // East: at least 2 cards of West's suit.
        assert!(east.length(chosen) >= 2, "east support missing");

        // Excluded 6-6 shapes never appear.
        let lengths = west.suit_lengths();
        assert_ne!(&lengths[..2], &[6, 6][..]);
    }
}

#[test]
fn generated_hands_can_render_text_and_lin() {
    let profile = wide_profile();
    let config = GeneratorConfig::reproducible();
    let set = generate_deals(&profile, 2, false, 77, &config, &mut NoopObserver).unwrap();

    let text = dealer_core::io::text::format_deal_set_text(&set.deals);
    assert!(text.contains("Board 1"));
    assert!(text.contains("Board 2"));

    for deal in &set.deals {
        let line = lin::encode_deal_line(deal);
        // 13 cards per hand: 4 suit letters + 13 ranks = 17 chars each.
        let md = line.split("|ah|").next().unwrap();
        let hands: Vec<&str> = md.split(',').collect();
        assert_eq!(hands.len(), 4);
        for h in &hands[1..] {
            assert_eq!(h.len(), 17, "hand segment {} in {}", h, line);
        }
    }
}

#[test]
fn sorted_hand_renders_high_to_low() {
    let mut hand = Hand::parse("K2.A.QJT9.87654");
    hand.sort();
    assert_eq!(hand.cards.first().unwrap().suit, Suit::Spades);
    assert_eq!(hand.cards.last().unwrap().suit, Suit::Clubs);
}
