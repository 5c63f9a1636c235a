use crate::board::{Deal, Seat};
use crate::hand::Hand;
use crate::suit::Suit;
use std::path::Path;

/// Render a deal as a human-readable block: North on top, West and East
/// side by side, South below, one suit per line with symbols.
pub fn format_deal_text(deal: &Deal) -> String {
    let header = format!(
        "Board {} — Dealer: {} — Vul: {}",
        deal.board_number,
        deal.dealer.name(),
        deal.vulnerability.label(),
    );

    let empty = Hand::default();
    let north = format_hand(deal.hand(Seat::North).unwrap_or(&empty));
    let south = format_hand(deal.hand(Seat::South).unwrap_or(&empty));
    let west = format_hand(deal.hand(Seat::West).unwrap_or(&empty));
    let east = format_hand(deal.hand(Seat::East).unwrap_or(&empty));

    let mut out = String::new();
    out.push_str(&header);
    out.push_str("\n\n");
    out.push_str(&center("North", 25));
    out.push('\n');
    out.push_str(&indent(&north, 11));
    out.push_str("\n\n");
    out.push_str(&side_by_side(&west, &east));
    out.push_str("\n\n");
    out.push_str(&center("South", 25));
    out.push('\n');
    out.push_str(&indent(&south, 11));
    out.trim_end().to_string()
}

pub fn format_deal_set_text(deals: &[Deal]) -> String {
    deals
        .iter()
        .map(format_deal_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn write_text_file(path: &Path, deals: &[Deal]) -> std::io::Result<()> {
    std::fs::write(path, format_deal_set_text(deals))
}

fn format_hand(hand: &Hand) -> String {
    let mut lines = Vec::with_capacity(4);
    for suit in Suit::DISPLAY_ORDER {
        let mut ranks: Vec<_> = hand
            .cards
            .iter()
            .filter(|c| c.suit == suit)
            .map(|c| c.rank)
            .collect();
        ranks.sort_by(|a, b| b.cmp(a));
        let rank_str = ranks
            .iter()
            .map(|r| r.to_char().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("{} {}", suit.symbol(), rank_str).trim_end().to_string());
    }
    lines.join("\n")
}

fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.len());
    format!("{}{}", " ".repeat(pad / 2), text)
}

fn indent(block: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    block
        .lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn side_by_side(west: &str, east: &str) -> String {
    let wl: Vec<&str> = west.lines().collect();
    let el: Vec<&str> = east.lines().collect();
    let mut rows = vec![format!("{:<20}{:>20}", "West", "East")];
    for i in 0..wl.len().max(el.len()) {
        let l = wl.get(i).unwrap_or(&"");
        let r = el.get(i).unwrap_or(&"");
        rows.push(format!("{:<20}    {}", l, r));
    }
    rows.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Vulnerability;
    use crate::deck;
    use std::collections::HashMap;

    #[test]
    fn test_text_layout_headers() {
        let deck = deck::build();
        let mut hands = HashMap::new();
        for (i, seat) in Seat::ALL.iter().enumerate() {
            hands.insert(*seat, Hand::new(deck[i * 13..(i + 1) * 13].to_vec()));
        }
        let deal = Deal {
            board_number: 3,
            dealer: Seat::East,
            vulnerability: Vulnerability::EW,
            hands,
        };
        let text = format_deal_text(&deal);
        assert!(text.starts_with("Board 3 — Dealer: East — Vul: EW"));
        assert!(text.contains("North"));
        assert!(text.contains("West"));
        assert!(text.contains("East"));
        assert!(text.contains("South"));
        assert!(text.contains('♠'));
    }
}
