//! Profile validation. Runs once at load; the builder's precondition is
//! a profile that has passed through here.

use crate::error::ProfileError;
use crate::feasibility;
use crate::profile::{ExtraConstraint, HandProfile, SubProfile};
use dealer_core::Seat;

const WEIGHT_SUM_TOLERANCE: f64 = 2.0;

/// Validate structural invariants and normalise per-seat weights to sum
/// to exactly 100.
pub fn validate_profile(profile: &mut HandProfile) -> Result<(), ProfileError> {
    check_dealing_order(profile)?;

    for seat in Seat::ALL {
        let Some(sp) = profile.seat_profiles.get(&seat) else {
            continue;
        };
        for sub in &sp.subprofiles {
            check_ranges(sub)?;
            check_extra(seat, sub)?;
        }
    }

    normalise_weights(profile)?;
    check_exclusions(profile)?;
    Ok(())
}

/// Cheap infeasibility screen, separate from structural validation:
/// every constrained seat needs at least one subprofile that is not
/// trivially impossible. Callers that prefer a hard error up front run
/// this; the builder's own unviable termination catches the rest.
pub fn validate_profile_viability_light(profile: &HandProfile) -> Result<(), ProfileError> {
    for seat in Seat::ALL {
        let Some(sp) = profile.seat_profiles.get(&seat) else {
            continue;
        };
        if sp.subprofiles.is_empty() {
            continue;
        }
        check_light_viability(seat, &sp.subprofiles)?;
    }
    Ok(())
}

fn check_dealing_order(profile: &HandProfile) -> Result<(), ProfileError> {
    let mut seen = [false; 4];
    for seat in profile.dealing_order {
        seen[seat.idx()] = true;
    }
    if seen != [true; 4] {
        return Err(ProfileError::BadDealingOrder);
    }
    Ok(())
}

/// Serde deserialisation bypasses the range constructors, so re-check
/// every range here.
fn check_ranges(sub: &SubProfile) -> Result<(), ProfileError> {
    let std = &sub.standard;
    for sr in [&std.spades, &std.hearts, &std.diamonds, &std.clubs] {
        if sr.min_cards > sr.max_cards {
            return Err(ProfileError::InvertedCardRange {
                min_cards: sr.min_cards,
                max_cards: sr.max_cards,
            });
        }
        if sr.min_hcp > sr.max_hcp {
            return Err(ProfileError::InvertedHcpRange {
                min_hcp: sr.min_hcp,
                max_hcp: sr.max_hcp,
            });
        }
    }
    if std.total_min_hcp > std.total_max_hcp {
        return Err(ProfileError::InvertedTotalHcp {
            min: std.total_min_hcp,
            max: std.total_max_hcp,
        });
    }
    Ok(())
}

fn check_extra(seat: Seat, sub: &SubProfile) -> Result<(), ProfileError> {
    match &sub.extra {
        Some(ExtraConstraint::RandomSuit(rs)) => {
            if !(1..=2).contains(&rs.required_suits_count) {
                return Err(ProfileError::BadRandomSuit(format!(
                    "required_suits_count must be 1 or 2, got {}",
                    rs.required_suits_count
                )));
            }
            if rs.required_suits_count > rs.allowed_suits.len() {
                return Err(ProfileError::BadRandomSuit(format!(
                    "required_suits_count {} exceeds {} allowed suits",
                    rs.required_suits_count,
                    rs.allowed_suits.len()
                )));
            }
            if rs.suit_ranges.len() < rs.required_suits_count {
                return Err(ProfileError::BadRandomSuit(format!(
                    "{} suit ranges for required_suits_count {}",
                    rs.suit_ranges.len(),
                    rs.required_suits_count
                )));
            }
            let mut seen = [false; 4];
            for suit in &rs.allowed_suits {
                if seen[suit.display_idx()] {
                    return Err(ProfileError::BadRandomSuit(format!(
                        "duplicate allowed suit {}",
                        suit
                    )));
                }
                seen[suit.display_idx()] = true;
            }
        }
        Some(ExtraConstraint::PartnerContingent(pc)) => {
            if pc.seat != seat.partner() {
                return Err(ProfileError::BadContingent {
                    seat: seat.to_char(),
                    reason: format!("partner_seat {} is not {}'s partner", pc.seat, seat),
                });
            }
        }
        Some(ExtraConstraint::OpponentContingent(oc)) => {
            if !oc.seat.is_opponent_of(seat) {
                return Err(ProfileError::BadContingent {
                    seat: seat.to_char(),
                    reason: format!("opponent_seat {} is not {}'s opponent", oc.seat, seat),
                });
            }
        }
        None => {}
    }
    Ok(())
}

fn check_light_viability(seat: Seat, subprofiles: &[SubProfile]) -> Result<(), ProfileError> {
    let mut last_reason = "no subprofiles checked";
    for sub in subprofiles {
        let (ok, reason) = feasibility::subprofile_is_viable_light(sub);
        if ok {
            return Ok(());
        }
        last_reason = reason;
    }
    Err(ProfileError::NoViableSubprofile {
        seat: seat.to_char(),
        reason: last_reason.to_string(),
    })
}

fn normalise_weights(profile: &mut HandProfile) -> Result<(), ProfileError> {
    for seat in Seat::ALL {
        let Some(sp) = profile.seat_profiles.get_mut(&seat) else {
            continue;
        };
        if sp.subprofiles.is_empty() {
            continue;
        }
        if sp.subprofiles.iter().any(|s| s.weight_percent < 0.0) {
            return Err(ProfileError::NegativeWeight { seat: seat.to_char() });
        }
        let sum: f64 = sp.subprofiles.iter().map(|s| s.weight_percent).sum();
        if (sum - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ProfileError::BadWeightSum { seat: seat.to_char(), sum });
        }
        if sum != 100.0 {
            let scale = 100.0 / sum;
            for sub in &mut sp.subprofiles {
                sub.weight_percent *= scale;
            }
        }
    }
    Ok(())
}

fn check_exclusions(profile: &HandProfile) -> Result<(), ProfileError> {
    for exc in &profile.subprofile_exclusions {
        let count = profile
            .seat_profiles
            .get(&exc.seat)
            .map(|sp| sp.subprofiles.len())
            .unwrap_or(0);
        if exc.subprofile_index == 0 || exc.subprofile_index > count {
            return Err(ProfileError::BadExclusionIndex {
                seat: exc.seat.to_char(),
                index: exc.subprofile_index,
            });
        }
    }
    Ok(())
}
