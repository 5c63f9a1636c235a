pub mod board;
pub mod card;
pub mod deck;
pub mod hand;
pub mod io;
pub mod rank;
pub mod suit;

pub use board::{Deal, Seat, Vulnerability};
pub use card::Card;
pub use hand::Hand;
pub use rank::Rank;
pub use suit::Suit;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deal_json_roundtrip() {
        let deck = deck::build();
        let mut hands = std::collections::HashMap::new();
        for (i, seat) in Seat::ALL.iter().enumerate() {
            hands.insert(*seat, Hand::new(deck[i * 13..(i + 1) * 13].to_vec()));
        }
        let deal = Deal {
            board_number: 7,
            dealer: Seat::West,
            vulnerability: Vulnerability::EW,
            hands,
        };
        let json = serde_json::to_string(&deal).unwrap();
        let back: Deal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.board_number, 7);
        assert_eq!(back.dealer, Seat::West);
        assert_eq!(back.hands[&Seat::North], deal.hands[&Seat::North]);
    }
}
