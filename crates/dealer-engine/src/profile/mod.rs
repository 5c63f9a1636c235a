//! In-memory hand-profile model: per-seat constraint packages that the
//! deal builder samples against.

pub mod validate;

use crate::error::ProfileError;
use dealer_core::{Seat, Suit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use validate::{validate_profile, validate_profile_viability_light};

/// Count and HCP bounds for one suit in one hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitRange {
    pub min_cards: u8,
    pub max_cards: u8,
    pub min_hcp: u8,
    pub max_hcp: u8,
}

impl SuitRange {
    pub fn new(min_cards: u8, max_cards: u8, min_hcp: u8, max_hcp: u8) -> Result<Self, ProfileError> {
        if min_cards > max_cards {
            return Err(ProfileError::InvertedCardRange { min_cards, max_cards });
        }
        if min_hcp > max_hcp {
            return Err(ProfileError::InvertedHcpRange { min_hcp, max_hcp });
        }
        Ok(Self { min_cards, max_cards, min_hcp, max_hcp })
    }

    /// 0–13 cards, 0–10 HCP: no constraint at all.
    pub fn any() -> Self {
        Self { min_cards: 0, max_cards: 13, min_hcp: 0, max_hcp: 10 }
    }

    pub fn contains(&self, count: u8, hcp: u8) -> bool {
        self.count_ok(count) && self.hcp_ok(hcp)
    }

    pub fn count_ok(&self, count: u8) -> bool {
        self.min_cards <= count && count <= self.max_cards
    }

    pub fn hcp_ok(&self, hcp: u8) -> bool {
        self.min_hcp <= hcp && hcp <= self.max_hcp
    }
}

/// Per-hand aggregate constraints: one range per suit plus total HCP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardConstraints {
    pub spades: SuitRange,
    pub hearts: SuitRange,
    pub diamonds: SuitRange,
    pub clubs: SuitRange,
    pub total_min_hcp: u8,
    pub total_max_hcp: u8,
}

impl StandardConstraints {
    pub fn new(
        spades: SuitRange,
        hearts: SuitRange,
        diamonds: SuitRange,
        clubs: SuitRange,
        total_min_hcp: u8,
        total_max_hcp: u8,
    ) -> Result<Self, ProfileError> {
        if total_min_hcp > total_max_hcp {
            return Err(ProfileError::InvertedTotalHcp { min: total_min_hcp, max: total_max_hcp });
        }
        Ok(Self { spades, hearts, diamonds, clubs, total_min_hcp, total_max_hcp })
    }

    /// Any 13 cards, 0–37 HCP.
    pub fn wide_open() -> Self {
        Self {
            spades: SuitRange::any(),
            hearts: SuitRange::any(),
            diamonds: SuitRange::any(),
            clubs: SuitRange::any(),
            total_min_hcp: 0,
            total_max_hcp: 37,
        }
    }

    pub fn suit_range(&self, suit: Suit) -> &SuitRange {
        match suit {
            Suit::Spades => &self.spades,
            Suit::Hearts => &self.hearts,
            Suit::Diamonds => &self.diamonds,
            Suit::Clubs => &self.clubs,
        }
    }

    pub fn total_hcp_ok(&self, hcp: u8) -> bool {
        self.total_min_hcp <= hcp && hcp <= self.total_max_hcp
    }
}

/// Override ranges applied when a specific unordered pair of suits is the
/// RS choice (required_suits_count == 2 only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairOverride {
    pub suits: [Suit; 2],
    pub first_range: SuitRange,
    pub second_range: SuitRange,
}

impl PairOverride {
    fn matches_pair(&self, chosen: &[Suit]) -> bool {
        chosen.len() == 2
            && chosen.contains(&self.suits[0])
            && chosen.contains(&self.suits[1])
    }
}

/// Random Suit: the generator picks `required_suits_count` distinct suits
/// from `allowed_suits`; each chosen suit must satisfy its range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomSuitConstraint {
    pub allowed_suits: Vec<Suit>,
    pub required_suits_count: usize,
    pub suit_ranges: Vec<SuitRange>,
    #[serde(default)]
    pub pair_overrides: Vec<PairOverride>,
}

impl RandomSuitConstraint {
    /// Resolve the effective range per chosen suit, applying a pair
    /// override when the chosen pair matches one.
    pub fn resolve_ranges(&self, chosen: &[Suit]) -> Vec<(Suit, SuitRange)> {
        if self.required_suits_count == 2 && chosen.len() == 2 {
            if let Some(po) = self.pair_overrides.iter().find(|po| po.matches_pair(chosen)) {
                return vec![
                    (po.suits[0], po.first_range),
                    (po.suits[1], po.second_range),
                ];
            }
        }
        chosen
            .iter()
            .zip(self.suit_ranges.iter())
            .map(|(suit, range)| (*suit, *range))
            .collect()
    }
}

/// Partner- or opponent-contingent: this seat must satisfy `suit_range`
/// in the referenced seat's RS-chosen suit (or an allowed-but-unchosen
/// suit when `use_non_chosen_suit` is set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingentConstraint {
    pub seat: Seat,
    pub suit_range: SuitRange,
    #[serde(default)]
    pub use_non_chosen_suit: bool,
}

/// At most one extra constraint per subprofile, made structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraConstraint {
    RandomSuit(RandomSuitConstraint),
    PartnerContingent(ContingentConstraint),
    OpponentContingent(ContingentConstraint),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    RandomSuit,
    PartnerContingent,
    OpponentContingent,
    Standard,
}

fn default_weight() -> f64 {
    100.0
}

/// One alternative constraint package within a seat profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubProfile {
    pub standard: StandardConstraints,
    #[serde(default)]
    pub extra: Option<ExtraConstraint>,
    #[serde(default = "default_weight")]
    pub weight_percent: f64,
    #[serde(default)]
    pub role_usage_tags: Vec<String>,
}

impl SubProfile {
    pub fn standard_only(standard: StandardConstraints) -> Self {
        Self {
            standard,
            extra: None,
            weight_percent: 100.0,
            role_usage_tags: Vec::new(),
        }
    }

    pub fn random_suit(&self) -> Option<&RandomSuitConstraint> {
        match &self.extra {
            Some(ExtraConstraint::RandomSuit(rs)) => Some(rs),
            _ => None,
        }
    }

    pub fn kind(&self) -> ConstraintKind {
        match &self.extra {
            Some(ExtraConstraint::RandomSuit(_)) => ConstraintKind::RandomSuit,
            Some(ExtraConstraint::PartnerContingent(_)) => ConstraintKind::PartnerContingent,
            Some(ExtraConstraint::OpponentContingent(_)) => ConstraintKind::OpponentContingent,
            None => ConstraintKind::Standard,
        }
    }
}

/// Ordered alternatives for one seat; exactly one is chosen per board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SeatProfile {
    pub subprofiles: Vec<SubProfile>,
}

impl SeatProfile {
    pub fn new(subprofiles: Vec<SubProfile>) -> Self {
        Self { subprofiles }
    }

    pub fn is_constrained(&self) -> bool {
        !self.subprofiles.is_empty()
    }
}

/// One cell of a 4-digit shape pattern: a literal length or a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCell {
    Any,
    Exact(u8),
}

/// A shape pattern in S-H-D-C order, e.g. "4333" or "5xx2". Matched
/// against the hand's suit-length vector, so suits of 10+ cards are
/// handled without any string rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapePattern {
    cells: [PatternCell; 4],
}

impl ShapePattern {
    pub fn parse(s: &str) -> Result<Self, ProfileError> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 4 {
            return Err(ProfileError::BadShapePattern(s.to_string()));
        }
        let mut cells = [PatternCell::Any; 4];
        for (i, c) in chars.iter().enumerate() {
            cells[i] = match c {
                'x' | 'X' => PatternCell::Any,
                '0'..='9' => PatternCell::Exact(*c as u8 - b'0'),
                _ => return Err(ProfileError::BadShapePattern(s.to_string())),
            };
        }
        Ok(Self { cells })
    }

    pub fn matches(&self, lengths: [u8; 4]) -> bool {
        self.cells
            .iter()
            .zip(lengths.iter())
            .all(|(cell, len)| match cell {
                PatternCell::Any => true,
                PatternCell::Exact(n) => n == len,
            })
    }
}

impl TryFrom<String> for ShapePattern {
    type Error = ProfileError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ShapePattern> for String {
    fn from(p: ShapePattern) -> String {
        p.cells
            .iter()
            .map(|cell| match cell {
                PatternCell::Any => 'x',
                PatternCell::Exact(n) => (b'0' + n) as char,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuitGroup {
    Any,
    Major,
    Minor,
}

impl SuitGroup {
    pub fn suits(self) -> &'static [Suit] {
        match self {
            SuitGroup::Any => &Suit::DISPLAY_ORDER,
            SuitGroup::Major => &[Suit::Spades, Suit::Hearts],
            SuitGroup::Minor => &[Suit::Diamonds, Suit::Clubs],
        }
    }
}

/// One clause: among the group's suits, exactly `count` must have length
/// `length_eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionClause {
    pub group: SuitGroup,
    pub length_eq: u8,
    pub count: u8,
}

impl ExclusionClause {
    pub fn holds(&self, lengths: [u8; 4]) -> bool {
        let got = self
            .group
            .suits()
            .iter()
            .filter(|s| lengths[s.display_idx()] == self.length_eq)
            .count() as u8;
        got == self.count
    }
}

/// Rejects otherwise-matching hands for one seat/subprofile: any shape
/// pattern hit, or all clauses holding, turns the match into a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubprofileExclusion {
    pub seat: Seat,
    /// 1-based index into the seat's subprofile list.
    pub subprofile_index: usize,
    #[serde(default)]
    pub shapes: Vec<ShapePattern>,
    #[serde(default)]
    pub clauses: Vec<ExclusionClause>,
}

impl SubprofileExclusion {
    pub fn matches(&self, lengths: [u8; 4]) -> bool {
        if self.shapes.iter().any(|p| p.matches(lengths)) {
            return true;
        }
        !self.clauses.is_empty() && self.clauses.iter().all(|c| c.holds(lengths))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProfileTag {
    #[default]
    Opener,
    Overcaller,
}

/// How a partnership's subprofile indices couple across a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoleMode {
    /// Couple when possible; the driver is the partnership's first seat
    /// in dealing order.
    #[default]
    Auto,
    /// Couple with an explicit driver seat.
    Driver(Seat),
    /// Never couple.
    Uncoupled,
}

fn default_version() -> u32 {
    1
}

fn default_rotate() -> bool {
    true
}

/// The full declarative constraint set for one kind of practice board.
/// Immutable during generation; validated once at load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandProfile {
    pub profile_name: String,
    pub dealer: Seat,
    pub dealing_order: [Seat; 4],
    #[serde(default)]
    pub tag: ProfileTag,
    pub seat_profiles: HashMap<Seat, SeatProfile>,
    #[serde(default)]
    pub subprofile_exclusions: Vec<SubprofileExclusion>,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_rotate")]
    pub rotate_by_default: bool,
    #[serde(default)]
    pub ns_role_mode: RoleMode,
    #[serde(default)]
    pub ew_role_mode: RoleMode,
    #[serde(default)]
    pub is_invariants_safety_profile: bool,
    #[serde(default)]
    pub use_rs_w_only_path: bool,
}

impl HandProfile {
    pub fn seat_profile(&self, seat: Seat) -> Option<&SeatProfile> {
        self.seat_profiles.get(&seat).filter(|sp| sp.is_constrained())
    }

    /// Seats with at least one subprofile, in fixed N, E, S, W order.
    pub fn constrained_seats(&self) -> Vec<Seat> {
        Seat::ALL
            .iter()
            .copied()
            .filter(|s| self.seat_profile(*s).is_some())
            .collect()
    }

    pub fn exclusions_for(&self, seat: Seat, subprofile_index_1based: usize) -> impl Iterator<Item = &SubprofileExclusion> {
        self.subprofile_exclusions
            .iter()
            .filter(move |e| e.seat == seat && e.subprofile_index == subprofile_index_1based)
    }
}
