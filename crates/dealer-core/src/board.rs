use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Seat {
    #[default]
    North,
    East,
    South,
    West,
}

impl Seat {
    pub const ALL: [Seat; 4] = [Seat::North, Seat::East, Seat::South, Seat::West];

    pub fn idx(self) -> usize {
        match self {
            Seat::North => 0,
            Seat::East => 1,
            Seat::South => 2,
            Seat::West => 3,
        }
    }

    pub fn partner(self) -> Self {
        match self {
            Seat::North => Seat::South,
            Seat::South => Seat::North,
            Seat::East => Seat::West,
            Seat::West => Seat::East,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Seat::North => Seat::East,
            Seat::East => Seat::South,
            Seat::South => Seat::West,
            Seat::West => Seat::North,
        }
    }

    pub fn is_opponent_of(self, other: Seat) -> bool {
        self != other && self.partner() != other
    }

    pub fn to_char(self) -> char {
        match self {
            Seat::North => 'N',
            Seat::East => 'E',
            Seat::South => 'S',
            Seat::West => 'W',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'N' => Some(Seat::North),
            'E' => Some(Seat::East),
            'S' => Some(Seat::South),
            'W' => Some(Seat::West),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Seat::North => "North",
            Seat::East => "East",
            Seat::South => "South",
            Seat::West => "West",
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Vulnerability {
    #[default]
    None,
    NS,
    EW,
    Both,
}

impl Vulnerability {
    /// The cyclic sequence applied across a deal set.
    pub const CYCLE: [Vulnerability; 4] = [
        Vulnerability::None,
        Vulnerability::NS,
        Vulnerability::EW,
        Vulnerability::Both,
    ];

    /// Cyclic vulnerability for a 1-based board number.
    pub fn for_board(board_number: u32) -> Self {
        Self::CYCLE[((board_number - 1) % 4) as usize]
    }

    pub fn is_vulnerable(self, seat: Seat) -> bool {
        match self {
            Vulnerability::None => false,
            Vulnerability::NS => seat == Seat::North || seat == Seat::South,
            Vulnerability::EW => seat == Seat::East || seat == Seat::West,
            Vulnerability::Both => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Vulnerability::None => "None",
            Vulnerability::NS => "NS",
            Vulnerability::EW => "EW",
            Vulnerability::Both => "Both",
        }
    }
}

use crate::hand::Hand;
use std::collections::HashMap;

/// One board: four 13-card hands with a dealer and vulnerability tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub board_number: u32,
    pub dealer: Seat,
    pub vulnerability: Vulnerability,
    pub hands: HashMap<Seat, Hand>,
}

impl Deal {
    pub fn hand(&self, seat: Seat) -> Option<&Hand> {
        self.hands.get(&seat)
    }

    /// Swap N↔S and E↔W in both hands and dealer. Vulnerability is
    /// deliberately untouched.
    pub fn rotate(&mut self) {
        let mut rotated = HashMap::with_capacity(4);
        for seat in Seat::ALL {
            if let Some(hand) = self.hands.remove(&seat.partner()) {
                rotated.insert(seat, hand);
            }
        }
        self.hands = rotated;
        self.dealer = self.dealer.partner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_partner() {
        assert_eq!(Seat::North.partner(), Seat::South);
        assert_eq!(Seat::West.partner(), Seat::East);
    }

    #[test]
    fn test_seat_opponents() {
        assert!(Seat::North.is_opponent_of(Seat::East));
        assert!(!Seat::North.is_opponent_of(Seat::South));
        assert!(!Seat::North.is_opponent_of(Seat::North));
    }

    #[test]
    fn test_vulnerability_cycle() {
        assert_eq!(Vulnerability::for_board(1), Vulnerability::None);
        assert_eq!(Vulnerability::for_board(2), Vulnerability::NS);
        assert_eq!(Vulnerability::for_board(3), Vulnerability::EW);
        assert_eq!(Vulnerability::for_board(4), Vulnerability::Both);
        assert_eq!(Vulnerability::for_board(5), Vulnerability::None);
    }

    #[test]
    fn test_vulnerability() {
        assert!(Vulnerability::NS.is_vulnerable(Seat::North));
        assert!(!Vulnerability::NS.is_vulnerable(Seat::East));
        assert!(Vulnerability::Both.is_vulnerable(Seat::West));
        assert!(!Vulnerability::None.is_vulnerable(Seat::South));
    }

    #[test]
    fn test_deal_rotation() {
        let mut hands = HashMap::new();
        hands.insert(Seat::North, Hand::parse("...A"));
        hands.insert(Seat::East, Hand::parse("..A."));
        hands.insert(Seat::South, Hand::parse(".A.."));
        hands.insert(Seat::West, Hand::parse("A..."));
        let mut deal = Deal {
            board_number: 1,
            dealer: Seat::North,
            vulnerability: Vulnerability::NS,
            hands,
        };
        deal.rotate();
        assert_eq!(deal.dealer, Seat::South);
        assert_eq!(deal.hands[&Seat::South], Hand::parse("...A"));
        assert_eq!(deal.hands[&Seat::West], Hand::parse("..A."));
        assert_eq!(deal.vulnerability, Vulnerability::NS);
    }
}
