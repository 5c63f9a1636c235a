//! Per-board subprofile selection: weighted choice with NS/EW index
//! coupling and cross-seat feasibility rejection.

use crate::feasibility::cross_seat_feasible;
use crate::profile::{HandProfile, RoleMode, SeatProfile, SubProfile};
use dealer_core::Seat;
use rand::Rng;
use std::collections::HashMap;

/// The concrete subprofile chosen for each constrained seat this board.
#[derive(Debug, Clone)]
pub struct Selection {
    pub subprofiles: HashMap<Seat, SubProfile>,
    /// 0-based index per seat; exclusions use index + 1.
    pub indices: HashMap<Seat, usize>,
}

/// Choose an index according to non-negative weights. Weights are scaled
/// by 10 and rounded to integers so the roulette wheel never hits float
/// boundary drift.
pub fn weighted_index<R: Rng>(rng: &mut R, weights: &[f64]) -> usize {
    let scaled: Vec<u64> = weights
        .iter()
        .map(|w| (w * 10.0).round().max(0.0) as u64)
        .collect();
    let total: u64 = scaled.iter().sum();
    if total == 0 {
        return rng.gen_range(0..weights.len());
    }
    let threshold = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    for (idx, w) in scaled.iter().enumerate() {
        cumulative += w;
        if threshold < cumulative {
            return idx;
        }
    }
    scaled.len() - 1
}

fn weights_for(sp: &SeatProfile) -> Vec<f64> {
    let weights: Vec<f64> = sp.subprofiles.iter().map(|s| s.weight_percent).collect();
    if weights.iter().all(|w| *w <= 0.0) {
        vec![1.0; weights.len()]
    } else {
        weights
    }
}

/// Choose a subprofile index for a single seat by its weights.
pub fn choose_index_for_seat<R: Rng>(rng: &mut R, sp: &SeatProfile) -> usize {
    if sp.subprofiles.len() <= 1 {
        return 0;
    }
    weighted_index(rng, &weights_for(sp))
}

/// Coupling applies when both partnership seats have the same subprofile
/// count greater than one.
fn coupling_possible(a: Option<&SeatProfile>, b: Option<&SeatProfile>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.subprofiles.len() > 1 && a.subprofiles.len() == b.subprofiles.len()
        }
        _ => false,
    }
}

fn resolve_driver(mode: RoleMode, pair: [Seat; 2], dealing_order: &[Seat; 4]) -> Seat {
    if let RoleMode::Driver(seat) = mode {
        if pair.contains(&seat) {
            return seat;
        }
    }
    dealing_order
        .iter()
        .copied()
        .find(|s| pair.contains(s))
        .unwrap_or(pair[0])
}

fn pick_once<R: Rng>(rng: &mut R, profile: &HandProfile) -> Selection {
    let mut subprofiles = HashMap::new();
    let mut indices = HashMap::new();

    let mut couple = |rng: &mut R,
                      mode: RoleMode,
                      pair: [Seat; 2],
                      subprofiles: &mut HashMap<Seat, SubProfile>,
                      indices: &mut HashMap<Seat, usize>| {
        if mode == RoleMode::Uncoupled {
            return;
        }
        let a = profile.seat_profile(pair[0]);
        let b = profile.seat_profile(pair[1]);
        if !coupling_possible(a, b) {
            return;
        }
        let driver = resolve_driver(mode, pair, &profile.dealing_order);
        let follower = driver.partner();
        let driver_sp = profile.seat_profile(driver).expect("coupling checked");
        let follower_sp = profile.seat_profile(follower).expect("coupling checked");

        let idx = choose_index_for_seat(rng, driver_sp);
        indices.insert(driver, idx);
        indices.insert(follower, idx);
        subprofiles.insert(driver, driver_sp.subprofiles[idx].clone());
        subprofiles.insert(follower, follower_sp.subprofiles[idx].clone());
    };

    couple(
        rng,
        profile.ns_role_mode,
        [Seat::North, Seat::South],
        &mut subprofiles,
        &mut indices,
    );
    couple(
        rng,
        profile.ew_role_mode,
        [Seat::East, Seat::West],
        &mut subprofiles,
        &mut indices,
    );

    // Remaining constrained seats pick independently, in fixed seat
    // order so the RNG stream is reproducible.
    for seat in Seat::ALL {
        if indices.contains_key(&seat) {
            continue;
        }
        let Some(sp) = profile.seat_profile(seat) else {
            continue;
        };
        let idx = choose_index_for_seat(rng, sp);
        indices.insert(seat, idx);
        subprofiles.insert(seat, sp.subprofiles[idx].clone());
    }

    Selection { subprofiles, indices }
}

/// Select a subprofile per constrained seat, retrying combinations that
/// cannot coexist in one deal. If every retry lands on an infeasible
/// combination, the last selection is returned and the attempt loop
/// deals with it.
pub fn select_subprofiles<R: Rng>(
    rng: &mut R,
    profile: &HandProfile,
    feasibility_retries: u32,
) -> Selection {
    let mut selection = pick_once(rng, profile);
    for _ in 0..feasibility_retries {
        let (feasible, _reason) = cross_seat_feasible(&selection.subprofiles);
        if feasible {
            return selection;
        }
        selection = pick_once(rng, profile);
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{StandardConstraints, SubProfile, SuitRange};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seat_profile_with(n: usize) -> SeatProfile {
        let sub = SubProfile::standard_only(StandardConstraints::wide_open());
        let mut subs = vec![sub; n];
        let share = 100.0 / n as f64;
        for s in &mut subs {
            s.weight_percent = share;
        }
        SeatProfile::new(subs)
    }

    fn profile_with_counts(counts: [usize; 4]) -> HandProfile {
        let mut seat_profiles = HashMap::new();
        for (seat, count) in Seat::ALL.into_iter().zip(counts) {
            if count > 0 {
                seat_profiles.insert(seat, seat_profile_with(count));
            }
        }
        HandProfile {
            profile_name: "sel".into(),
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
    fn test_weighted_choice_converges_to_ratio() {
        let mut rng = StdRng::seed_from_u64(11);
        let weights = [30.0, 70.0];
        let trials = 20_000;
        let mut first = 0u32;
        for _ in 0..trials {
            if weighted_index(&mut rng, &weights) == 0 {
                first += 1;
            }
        }
        let rate = f64::from(first) / f64::from(trials);
        assert!((rate - 0.30).abs() < 0.02, "rate was {}", rate);
    }

    #[test]
    fn test_weighted_choice_zero_weight_never_picked() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            assert_eq!(weighted_index(&mut rng, &[0.0, 100.0]), 1);
        }
    }

    #[test]
    fn test_ns_coupling_forces_same_index() {
        let profile = profile_with_counts([3, 0, 3, 0]);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let sel = select_subprofiles(&mut rng, &profile, 10);
            assert_eq!(sel.indices[&Seat::North], sel.indices[&Seat::South]);
        }
    }

    #[test]
    fn test_ew_coupling_forces_same_index() {
        let profile = profile_with_counts([0, 4, 0, 4]);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let sel = select_subprofiles(&mut rng, &profile, 10);
            assert_eq!(sel.indices[&Seat::East], sel.indices[&Seat::West]);
        }
    }

    #[test]
    fn test_uncoupled_mode_allows_divergence() {
        let mut profile = profile_with_counts([3, 0, 3, 0]);
        profile.ns_role_mode = RoleMode::Uncoupled;
        let mut rng = StdRng::seed_from_u64(5);
        let mut diverged = false;
        for _ in 0..100 {
            let sel = select_subprofiles(&mut rng, &profile, 10);
            if sel.indices[&Seat::North] != sel.indices[&Seat::South] {
                diverged = true;
                break;
            }
        }
        assert!(diverged);
    }

    #[test]
    fn test_unequal_counts_disable_coupling() {
        let profile = profile_with_counts([2, 0, 3, 0]);
        let mut rng = StdRng::seed_from_u64(5);
        // Must not panic and must fill both seats independently.
        let sel = select_subprofiles(&mut rng, &profile, 10);
        assert!(sel.indices.contains_key(&Seat::North));
        assert!(sel.indices.contains_key(&Seat::South));
    }

    #[test]
    fn test_single_subprofile_always_index_zero() {
        let profile = profile_with_counts([1, 1, 1, 1]);
        let mut rng = StdRng::seed_from_u64(5);
        let sel = select_subprofiles(&mut rng, &profile, 10);
        for seat in Seat::ALL {
            assert_eq!(sel.indices[&seat], 0);
        }
    }

    #[test]
    fn test_infeasible_combination_retried() {
        // N has one heavy subprofile (min 22 HCP) and one light; S has
        // the same pair uncoupled. The 22+22 combination is infeasible,
        // so feasible selections must dominate heavily.
        let mut heavy = SubProfile::standard_only(StandardConstraints::wide_open());
        heavy.standard.total_min_hcp = 22;
        heavy.weight_percent = 50.0;
        let mut light = SubProfile::standard_only(StandardConstraints::wide_open());
        light.standard.total_max_hcp = 10;
        light.weight_percent = 50.0;

        let mut profile = profile_with_counts([0, 0, 0, 0]);
        profile.ns_role_mode = RoleMode::Uncoupled;
        profile
            .seat_profiles
            .insert(Seat::North, SeatProfile::new(vec![heavy.clone(), light.clone()]));
        profile
            .seat_profiles
            .insert(Seat::South, SeatProfile::new(vec![heavy, light]));

        let mut rng = StdRng::seed_from_u64(9);
        let mut both_heavy = 0;
        let trials = 200;
        for _ in 0..trials {
            let sel = select_subprofiles(&mut rng, &profile, 10);
            if sel.indices[&Seat::North] == 0 && sel.indices[&Seat::South] == 0 {
                both_heavy += 1;
            }
        }
        // Without retries this would be ~25% of trials; with 10 retries
        // it should be vanishingly rare.
        assert!(both_heavy < 5, "both_heavy was {}", both_heavy);
    }

    #[test]
    fn test_explicit_driver_seat_respected() {
        let mut profile = profile_with_counts([3, 0, 3, 0]);
        profile.ns_role_mode = RoleMode::Driver(Seat::South);
        let mut rng = StdRng::seed_from_u64(5);
        let sel = select_subprofiles(&mut rng, &profile, 10);
        // Driver choice is not observable from indices alone (they are
        // forced equal), but selection must still cover both seats.
        assert_eq!(sel.indices[&Seat::North], sel.indices[&Seat::South]);
        assert_eq!(sel.subprofiles.len(), 2);
    }
}
