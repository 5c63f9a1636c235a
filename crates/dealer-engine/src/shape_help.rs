//! The shape-help dealer: shortcut rejection sampling when seats have
//! statistically tight shape requirements. Pre-selects RS suits, reserves
//! suit-specific cards for tight seats, gates on HCP feasibility, and
//! fills the rest with a constrained front-to-back walk of the shuffled
//! deck.

use crate::config::GeneratorConfig;
use crate::feasibility::{check_hcp_feasibility, SHAPE_PROB_GTE};
use crate::profile::{HandProfile, SubProfile};
use dealer_core::deck::{FULL_DECK_HCP_SUM, FULL_DECK_HCP_SUM_SQ};
use dealer_core::{Card, Seat, Suit};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Seats whose chosen subprofile has at least one suit minimum unlikely
/// enough (P <= threshold under uniform dealing) to deserve help.
///
/// RS seats are judged on their resolved per-suit ranges for the
/// pre-selected suits, so a requirement living entirely in the RS
/// constraint still flags the seat.
pub fn dispersion_check(
    chosen: &HashMap<Seat, SubProfile>,
    rs_pre: &HashMap<Seat, Vec<Suit>>,
    threshold: f64,
) -> HashSet<Seat> {
    let mut tight = HashSet::new();

    for seat in Seat::ALL {
        let Some(sub) = chosen.get(&seat) else {
            continue;
        };
        for suit in Suit::DISPLAY_ORDER {
            let min_cards = sub.standard.suit_range(suit).min_cards.min(13);
            if min_cards == 0 {
                continue;
            }
            if SHAPE_PROB_GTE[min_cards as usize] <= threshold {
                tight.insert(seat);
                break;
            }
        }

        if tight.contains(&seat) {
            continue;
        }
        let (Some(rs), Some(pre)) = (sub.random_suit(), rs_pre.get(&seat)) else {
            continue;
        };
        for (_, sr) in rs.resolve_ranges(pre) {
            let min_cards = sr.min_cards.min(13);
            if min_cards == 0 {
                continue;
            }
            if SHAPE_PROB_GTE[min_cards as usize] <= threshold {
                tight.insert(seat);
                break;
            }
        }
    }

    tight
}

/// Sample each RS seat's suits before dealing so pre-allocation and
/// matching agree on the same choice.
pub fn pre_select_rs_suits<R: Rng>(
    rng: &mut R,
    chosen: &HashMap<Seat, SubProfile>,
) -> HashMap<Seat, Vec<Suit>> {
    let mut pre = HashMap::new();
    // Fixed seat order: this consumes the RNG stream.
    for seat in Seat::ALL {
        let Some(rs) = chosen.get(&seat).and_then(|sub| sub.random_suit()) else {
            continue;
        };
        if rs.required_suits_count == 0 || rs.required_suits_count > rs.allowed_suits.len() {
            continue;
        }
        let suits: Vec<Suit> = rs
            .allowed_suits
            .choose_multiple(rng, rs.required_suits_count)
            .copied()
            .collect();
        pre.insert(seat, suits);
    }
    pre
}

/// Effective max cards per suit (S, H, D, C): standard maxima tightened
/// by RS maxima for pre-selected suits.
pub fn suit_maxima(sub: &SubProfile, rs_chosen: Option<&[Suit]>) -> [u8; 4] {
    let mut maxima = [13u8; 4];
    for suit in Suit::DISPLAY_ORDER {
        let mc = sub.standard.suit_range(suit).max_cards;
        let slot = &mut maxima[suit.display_idx()];
        if mc < *slot {
            *slot = mc;
        }
    }
    if let (Some(rs), Some(chosen)) = (sub.random_suit(), rs_chosen) {
        for (suit, sr) in rs.resolve_ranges(chosen) {
            let slot = &mut maxima[suit.display_idx()];
            if sr.max_cards < *slot {
                *slot = sr.max_cards;
            }
        }
    }
    maxima
}

/// Per-suit HCP caps for RS suits that carry one; `None` when no suit is
/// capped below the 10-HCP ceiling.
fn rs_suit_hcp_caps(sub: &SubProfile, rs_chosen: Option<&[Suit]>) -> Option<[Option<u8>; 4]> {
    let (rs, chosen) = (sub.random_suit()?, rs_chosen?);
    let mut caps = [None; 4];
    let mut any = false;
    for (suit, sr) in rs.resolve_ranges(chosen) {
        if sr.max_hcp < 10 {
            caps[suit.display_idx()] = Some(sr.max_hcp);
            any = true;
        }
    }
    any.then_some(caps)
}

/// Deal n cards off the front of the (already shuffled) deck.
pub fn random_deal(deck: &mut Vec<Card>, n: usize) -> Vec<Card> {
    let take = n.min(deck.len());
    deck.drain(..take).collect()
}

/// Fill n cards from a shuffled deck, skipping any card that would bust
/// a suit maximum, push total HCP past the hand's maximum, or bust a
/// per-suit HCP cap on an RS suit. Skipped cards stay in the deck, in
/// their original relative order, for later seats.
///
/// The deck walk front-to-back over a shuffled deck is itself a uniform
/// sample, so accept/skip here is rejection sampling that never loses
/// cards other seats might still need.
pub fn constrained_fill(
    deck: &mut Vec<Card>,
    n: usize,
    pre_cards: &[Card],
    maxima: [u8; 4],
    total_max_hcp: u8,
    rs_hcp_caps: Option<[Option<u8>; 4]>,
) -> Vec<Card> {
    if n == 0 {
        return Vec::new();
    }

    let mut suit_count = [0u8; 4];
    let mut suit_hcp = [0u8; 4];
    let mut current_hcp = 0u8;
    for c in pre_cards {
        let i = c.suit.display_idx();
        suit_count[i] += 1;
        suit_hcp[i] += c.hcp();
        current_hcp += c.hcp();
    }

    let mut accepted = Vec::with_capacity(n);
    let mut remaining = Vec::with_capacity(deck.len());

    for card in deck.drain(..) {
        if accepted.len() >= n {
            remaining.push(card);
            continue;
        }

        let i = card.suit.display_idx();
        let hcp = card.hcp();

        if suit_count[i] >= maxima[i] {
            remaining.push(card);
            continue;
        }
        // Spot cards never move the HCP needle; only honors can bust.
        if hcp > 0 && current_hcp + hcp > total_max_hcp {
            remaining.push(card);
            continue;
        }
        if let Some(caps) = rs_hcp_caps {
            if let Some(cap) = caps[i] {
                if hcp > 0 && suit_hcp[i] + hcp > cap {
                    remaining.push(card);
                    continue;
                }
            }
        }

        suit_count[i] += 1;
        suit_hcp[i] += hcp;
        current_hcp += hcp;
        accepted.push(card);
    }

    *deck = remaining;
    accepted
}

fn remove_from_deck(deck: &mut Vec<Card>, taken: &[Card]) {
    let taken_set: HashSet<Card> = taken.iter().copied().collect();
    deck.retain(|c| !taken_set.contains(c));
}

/// Reserve a fraction of each standard suit minimum for a tight seat.
pub fn pre_allocate<R: Rng>(
    rng: &mut R,
    deck: &mut Vec<Card>,
    sub: &SubProfile,
    fraction: f64,
) -> Vec<Card> {
    let mut by_suit: [Vec<Card>; 4] = Default::default();
    for c in deck.iter() {
        by_suit[c.suit.display_idx()].push(*c);
    }

    let mut reserved = Vec::new();
    for suit in Suit::DISPLAY_ORDER {
        let min_cards = sub.standard.suit_range(suit).min_cards;
        if min_cards == 0 {
            continue;
        }
        let to_allocate = (f64::from(min_cards) * fraction).floor() as usize;
        if to_allocate == 0 {
            continue;
        }
        let available = &by_suit[suit.display_idx()];
        if available.is_empty() {
            continue;
        }
        let take = to_allocate.min(available.len());
        reserved.extend(available.choose_multiple(rng, take).copied());
    }

    remove_from_deck(deck, &reserved);
    reserved
}

/// Reserve cards for a seat's pre-selected RS suits, rejection-sampling
/// toward a pro-rated HCP window so the fill does not have to dig the
/// suit out of an HCP hole later.
pub fn pre_allocate_rs<R: Rng>(
    rng: &mut R,
    deck: &mut Vec<Card>,
    sub: &SubProfile,
    chosen_suits: &[Suit],
    fraction: f64,
    hcp_retries: u32,
) -> Vec<Card> {
    let Some(rs) = sub.random_suit() else {
        return Vec::new();
    };

    let mut by_suit: [Vec<Card>; 4] = Default::default();
    for c in deck.iter() {
        by_suit[c.suit.display_idx()].push(*c);
    }

    let mut reserved = Vec::new();
    for (suit, sr) in rs.resolve_ranges(chosen_suits) {
        if sr.min_cards == 0 {
            continue;
        }
        let to_allocate = (f64::from(sr.min_cards) * fraction).floor() as usize;
        if to_allocate == 0 {
            continue;
        }
        let available = &by_suit[suit.display_idx()];
        if available.is_empty() {
            continue;
        }
        let take = to_allocate.min(available.len());

        let mut sample: Vec<Card> = available.choose_multiple(rng, take).copied().collect();
        if hcp_retries > 0 {
            // Pro-rate the suit HCP window to the reserved count, e.g.
            // 6 cards wanting 5-7 HCP -> 3 reserved wanting 2-4.
            let target_low = (f64::from(sr.min_hcp) * take as f64 / f64::from(sr.min_cards)).floor();
            let target_high = (f64::from(sr.max_hcp) * take as f64 / f64::from(sr.min_cards)).ceil();
            for _ in 0..hcp_retries {
                let hcp: u32 = sample.iter().map(|c| u32::from(c.hcp())).sum();
                let hcp = f64::from(hcp);
                if target_low <= hcp && hcp <= target_high {
                    break;
                }
                sample = available.choose_multiple(rng, take).copied().collect();
            }
            // Whatever the last sample was, use it.
        }
        reserved.extend(sample);
    }

    remove_from_deck(deck, &reserved);
    reserved
}

/// Dealing order with the least constrained seat last: RS seats first
/// (others depend on their choices and they draw from the fullest deck),
/// then PC/OC, then standard; narrower total-HCP range breaks ties, then
/// clockwise position from the dealer.
pub fn compute_dealing_order(chosen: &HashMap<Seat, SubProfile>, dealer: Seat) -> [Seat; 4] {
    let mut clockwise = [dealer; 4];
    let mut s = dealer;
    for slot in clockwise.iter_mut() {
        *slot = s;
        s = s.next();
    }

    let risk_rank = |seat: Seat| -> u8 {
        match chosen.get(&seat) {
            None => 0,
            Some(sub) => match sub.kind() {
                crate::profile::ConstraintKind::RandomSuit => 2,
                crate::profile::ConstraintKind::PartnerContingent
                | crate::profile::ConstraintKind::OpponentContingent => 1,
                crate::profile::ConstraintKind::Standard => 0,
            },
        }
    };
    let hcp_span = |seat: Seat| -> u8 {
        match chosen.get(&seat) {
            None => 37,
            Some(sub) => sub
                .standard
                .total_max_hcp
                .saturating_sub(sub.standard.total_min_hcp),
        }
    };
    let cw_pos = |seat: Seat| -> usize {
        clockwise.iter().position(|s| *s == seat).unwrap_or(0)
    };

    let mut order = clockwise;
    order.sort_by_key(|seat| (std::cmp::Reverse(risk_rank(*seat)), hcp_span(*seat), cw_pos(*seat)));
    order
}

/// Matching order for one attempt: constrained seats with RS first so
/// partner/opponent contingents can see their choices, then the rest.
/// Distinct from dealing order by design.
pub fn processing_order(
    profile: &HandProfile,
    dealing_order: &[Seat; 4],
    chosen: &HashMap<Seat, SubProfile>,
) -> Vec<Seat> {
    let mut rs_seats = Vec::new();
    let mut other_seats = Vec::new();
    for seat in dealing_order {
        if profile.seat_profile(*seat).is_none() {
            continue;
        }
        match chosen.get(seat) {
            Some(sub) if sub.random_suit().is_some() => rs_seats.push(*seat),
            Some(_) => other_seats.push(*seat),
            None => {}
        }
    }
    rs_seats.extend(other_seats);
    rs_seats
}

/// Deal 52 cards to 4 seats with shape help for tight seats.
///
/// Returns `Err(seat)` when the HCP feasibility gate finds a seat whose
/// pre-allocated cards make its total-HCP target statistically
/// implausible, skipping the fill and the matcher for this attempt.
pub fn deal_with_help<R: Rng>(
    rng: &mut R,
    deck: &mut Vec<Card>,
    chosen: &HashMap<Seat, SubProfile>,
    tight: &HashSet<Seat>,
    dealing_order: &[Seat; 4],
    rs_pre: &HashMap<Seat, Vec<Suit>>,
    config: &GeneratorConfig,
) -> Result<HashMap<Seat, Vec<Card>>, Seat> {
    // Phase 1: reserve cards for every tight seat, regardless of its
    // dealing position.
    let mut pre_allocated: HashMap<Seat, Vec<Card>> = HashMap::new();
    for seat in dealing_order {
        if !tight.contains(seat) {
            continue;
        }
        let Some(sub) = chosen.get(seat) else {
            continue;
        };
        let mut pre = pre_allocate(rng, deck, sub, config.pre_allocate_fraction);
        if let Some(suits) = rs_pre.get(seat) {
            pre.extend(pre_allocate_rs(
                rng,
                deck,
                sub,
                suits,
                config.rs_pre_allocate_fraction,
                config.rs_pre_allocate_hcp_retries,
            ));
        }
        if !pre.is_empty() {
            pre_allocated.insert(*seat, pre);
        }
    }

    // Phase 2: HCP feasibility gate, after all reservations so the deck
    // stats are final. Deck aggregates come from the full-deck constants
    // minus the removed contributions, so no deck scan.
    if config.enable_hcp_feasibility && !pre_allocated.is_empty() {
        let mut removed_sum = 0u32;
        let mut removed_sum_sq = 0u32;
        for cards in pre_allocated.values() {
            for c in cards {
                let v = u32::from(c.hcp());
                removed_sum += v;
                removed_sum_sq += v * v;
            }
        }
        let deck_hcp_sum = FULL_DECK_HCP_SUM - removed_sum;
        let deck_hcp_sum_sq = FULL_DECK_HCP_SUM_SQ - removed_sum_sq;
        let deck_size = deck.len() as u32;

        for seat in dealing_order {
            let Some(pre) = pre_allocated.get(seat) else {
                continue;
            };
            let Some(sub) = chosen.get(seat) else {
                continue;
            };
            let drawn_hcp: u32 = pre.iter().map(|c| u32::from(c.hcp())).sum();
            let cards_remaining = 13u32.saturating_sub(pre.len() as u32);
            if cards_remaining > 0
                && deck_size > 0
                && !check_hcp_feasibility(
                    drawn_hcp,
                    cards_remaining,
                    deck_size,
                    deck_hcp_sum,
                    deck_hcp_sum_sq,
                    sub.standard.total_min_hcp,
                    sub.standard.total_max_hcp,
                    config.hcp_feasibility_num_sd,
                )
            {
                return Err(*seat);
            }
        }
    }

    // Phase 3: fill to 13. Non-last seats use the constrained walk;
    // skipped cards stay available. The last seat takes the remainder.
    let mut hands = HashMap::with_capacity(4);
    for (i, seat) in dealing_order.iter().enumerate() {
        let is_last = i == dealing_order.len() - 1;
        let mut hand = pre_allocated.remove(seat).unwrap_or_default();

        if is_last {
            hand.append(deck);
        } else {
            // Over-allocation (overlapping standard and RS reservations)
            // leaves a >13-card hand; the matcher rejects it naturally.
            let needed = 13usize.saturating_sub(hand.len());
            match chosen.get(seat) {
                Some(sub) => {
                    let rs_for_seat = rs_pre.get(seat).map(|v| v.as_slice());
                    let maxima = suit_maxima(sub, rs_for_seat);
                    let caps = rs_suit_hcp_caps(sub, rs_for_seat);
                    let fill = constrained_fill(
                        deck,
                        needed,
                        &hand,
                        maxima,
                        sub.standard.total_max_hcp,
                        caps,
                    );
                    hand.extend(fill);
                }
                None => hand.extend(random_deal(deck, needed)),
            }
        }
        hands.insert(*seat, hand);
    }

    Ok(hands)
}
