//! Evaluate one 13-card hand against one subprofile: standard ranges
//! first, then the RS / partner-contingent / opponent-contingent extra,
//! then subprofile exclusions.

use crate::profile::{ExtraConstraint, HandProfile, SubProfile, SuitRange};
use dealer_core::{Card, Seat, Suit};
use rand::seq::SliceRandom;
use rand::Rng;

/// Why a hand failed to match, for attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    Hcp,
    Shape,
    Other,
}

/// Per-suit counts and HCP plus total HCP for one hand. O(13) to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuitAnalysis {
    pub lengths: [u8; 4],
    pub hcp: [u8; 4],
    pub total_hcp: u8,
}

impl SuitAnalysis {
    pub fn of(hand: &[Card]) -> Self {
        let mut lengths = [0u8; 4];
        let mut hcp = [0u8; 4];
        let mut total_hcp = 0u8;
        for card in hand {
            let i = card.suit.display_idx();
            lengths[i] += 1;
            let v = card.hcp();
            hcp[i] += v;
            total_hcp += v;
        }
        Self { lengths, hcp, total_hcp }
    }

    pub fn length(&self, suit: Suit) -> u8 {
        self.lengths[suit.display_idx()]
    }

    pub fn hcp_in(&self, suit: Suit) -> u8 {
        self.hcp[suit.display_idx()]
    }

    fn suit_ok(&self, suit: Suit, sr: &SuitRange) -> bool {
        sr.contains(self.length(suit), self.hcp_in(suit))
    }
}

/// One seat's recorded Random Suit outcome: the chosen suits plus the
/// full allowed set (the latter feeds "non-chosen suit" contingents).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsChoice {
    pub chosen: Vec<Suit>,
    pub allowed: Vec<Suit>,
}

impl RsChoice {
    pub fn non_chosen(&self) -> impl Iterator<Item = Suit> + '_ {
        self.allowed
            .iter()
            .copied()
            .filter(|s| !self.chosen.contains(s))
    }
}

/// Shared RS choices for one board attempt. Stack-allocated and owned by
/// the attempt; written only by RS pre-seeding and successful RS matches.
#[derive(Debug, Clone, Default)]
pub struct RsChoices {
    slots: [Option<RsChoice>; 4],
}

impl RsChoices {
    pub fn get(&self, seat: Seat) -> Option<&RsChoice> {
        self.slots[seat.idx()].as_ref()
    }

    pub fn set(&mut self, seat: Seat, choice: RsChoice) {
        self.slots[seat.idx()] = Some(choice);
    }
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub matched: bool,
    /// Chosen RS suits, kept even on failure so bucket statistics update.
    pub chosen_rs: Option<Vec<Suit>>,
    pub fail: Option<FailReason>,
}

impl MatchOutcome {
    fn ok(chosen_rs: Option<Vec<Suit>>) -> Self {
        Self { matched: true, chosen_rs, fail: None }
    }

    fn fail(reason: FailReason, chosen_rs: Option<Vec<Suit>>) -> Self {
        Self { matched: false, chosen_rs, fail: Some(reason) }
    }
}

/// Check standard constraints in fixed order: total HCP, then per suit
/// (S, H, D, C) count before HCP. The first failure wins.
pub fn match_standard(
    analysis: &SuitAnalysis,
    std: &crate::profile::StandardConstraints,
) -> Option<FailReason> {
    if !std.total_hcp_ok(analysis.total_hcp) {
        return Some(FailReason::Hcp);
    }
    for suit in Suit::DISPLAY_ORDER {
        let sr = std.suit_range(suit);
        if !sr.count_ok(analysis.length(suit)) {
            return Some(FailReason::Shape);
        }
        if !sr.hcp_ok(analysis.hcp_in(suit)) {
            return Some(FailReason::Hcp);
        }
    }
    None
}

/// Match one hand against the chosen subprofile for a seat.
///
/// `rs_pre_selection` threads the builder's pre-committed RS suits down
/// so matching agrees with pre-allocation; without it, RS suits are
/// sampled uniformly from the allowed set.
#[allow(clippy::too_many_arguments)]
pub fn match_seat<R: Rng>(
    profile: &HandProfile,
    seat: Seat,
    hand: &[Card],
    sub: &SubProfile,
    subprofile_index_1based: usize,
    rs_choices: &RsChoices,
    rs_pre_selection: Option<&[Suit]>,
    rng: &mut R,
) -> MatchOutcome {
    let analysis = SuitAnalysis::of(hand);

    if let Some(reason) = match_standard(&analysis, &sub.standard) {
        return MatchOutcome::fail(reason, None);
    }

    let chosen_rs = match &sub.extra {
        Some(ExtraConstraint::RandomSuit(rs)) => {
            let chosen: Vec<Suit> = match rs_pre_selection {
                Some(pre) => pre.to_vec(),
                None => rs
                    .allowed_suits
                    .choose_multiple(rng, rs.required_suits_count)
                    .copied()
                    .collect(),
            };
            let resolved = rs.resolve_ranges(&chosen);
            if resolved.len() < rs.required_suits_count {
                return MatchOutcome::fail(FailReason::Other, Some(chosen));
            }
            for (suit, sr) in &resolved {
                if !analysis.suit_ok(*suit, sr) {
                    return MatchOutcome::fail(FailReason::Other, Some(chosen));
                }
            }
            Some(chosen)
        }
        Some(ExtraConstraint::PartnerContingent(pc))
        | Some(ExtraConstraint::OpponentContingent(pc)) => {
            let Some(choice) = rs_choices.get(pc.seat) else {
                // Referenced seat has no recorded RS choice yet.
                return MatchOutcome::fail(FailReason::Other, None);
            };
            let satisfied = if pc.use_non_chosen_suit {
                choice.non_chosen().any(|s| analysis.suit_ok(s, &pc.suit_range))
            } else {
                match choice.chosen.first() {
                    Some(&s) => analysis.suit_ok(s, &pc.suit_range),
                    None => false,
                }
            };
            if !satisfied {
                return MatchOutcome::fail(FailReason::Other, None);
            }
            None
        }
        None => None,
    };

    // Exclusions run last, on otherwise-matching hands only. A hit keeps
    // any chosen RS suits so the caller still updates that bucket.
    let excluded = profile
        .exclusions_for(seat, subprofile_index_1based)
        .any(|e| e.matches(analysis.lengths));
    if excluded {
        return MatchOutcome::fail(FailReason::Other, chosen_rs);
    }

    MatchOutcome::ok(chosen_rs)
}
