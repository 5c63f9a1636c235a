use crate::board::{Deal, Seat, Vulnerability};
use crate::hand::Hand;
use crate::suit::Suit;
use std::io::Write;
use std::path::Path;

/// Encode one deal into a BBO LIN line:
///
/// `qx|o<n>|md|<dealerCode><South>,<West>,<North>,<East>|ah|Board <n>|sv|<vulCode>|pg||`
///
/// BBO expects the hand segments in S, W, N, E order regardless of who
/// the dealer is; the numeric dealer code carries the dealer.
pub fn encode_deal_line(deal: &Deal) -> String {
    let dealer_code = dealer_code(deal.dealer);

    let empty = Hand::default();
    let mut md = format!("md|{}", dealer_code);
    for (i, seat) in [Seat::South, Seat::West, Seat::North, Seat::East]
        .iter()
        .enumerate()
    {
        if i > 0 {
            md.push(',');
        }
        md.push_str(&encode_hand(deal.hand(*seat).unwrap_or(&empty)));
    }

    format!(
        "qx|o{}|{}|ah|Board {}|sv|{}|pg||",
        deal.board_number,
        md,
        deal.board_number,
        vul_code(deal.vulnerability),
    )
}

/// Write one LIN line per deal.
pub fn write_lin_file(path: &Path, deals: &[Deal]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    for deal in deals {
        writeln!(file, "{}", encode_deal_line(deal))?;
    }
    Ok(())
}

fn encode_hand(hand: &Hand) -> String {
    let mut s = String::with_capacity(17);
    for suit in Suit::DISPLAY_ORDER {
        s.push(suit.to_char());
        let mut ranks: Vec<_> = hand
            .cards
            .iter()
            .filter(|c| c.suit == suit)
            .map(|c| c.rank)
            .collect();
        ranks.sort_by(|a, b| b.cmp(a));
        for rank in ranks {
            s.push(rank.to_char());
        }
    }
    s
}

fn dealer_code(dealer: Seat) -> char {
    match dealer {
        Seat::South => '1',
        Seat::West => '2',
        Seat::North => '3',
        Seat::East => '4',
    }
}

fn vul_code(vul: Vulnerability) -> char {
    match vul {
        Vulnerability::None => '0',
        Vulnerability::NS => 'n',
        Vulnerability::EW => 'e',
        Vulnerability::Both => 'b',
    }
}
