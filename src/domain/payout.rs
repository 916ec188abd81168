//! Pari-mutuel payout math.
//!
//! All stakes on a race form a shared pot. Once a winner is drawn, the pot
//! is divided among bets on the winner proportional to their stake:
//! `multiplier = total_pot / winning_pot`, `payout = stake × multiplier`.
//!
//! When nobody backed the winner the winning pot is zero and no payouts
//! occur; every bet loses. The multiplier is reported as `None` rather
//! than dividing by zero.

use rust_decimal::{Decimal, RoundingStrategy};

use super::race::{Bet, BetId, ParticipantId};

/// Payout owed to a single winning bet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutLine {
    /// Winning bet.
    pub bet_id: BetId,
    /// Amount to credit to the bet's owner, rounded to cents.
    pub payout: Decimal,
}

/// Complete payout computation for one race.
///
/// Built from ALL bets of the race regardless of payout status, so a
/// resumed settlement recomputes the exact same multiplier and per-bet
/// payouts as the interrupted one.
#[derive(Debug, Clone)]
pub struct PayoutSheet {
    /// Sum of every stake on the race.
    pub total_pot: Decimal,
    /// Sum of stakes on the winning participant.
    pub winning_pot: Decimal,
    /// `total_pot / winning_pot`, or `None` when the winner was unbacked.
    pub multiplier: Option<Decimal>,
    /// One line per bet on the winning participant.
    pub lines: Vec<PayoutLine>,
}

impl PayoutSheet {
    /// Compute the payout sheet for a race given its full bet list and
    /// the drawn winner.
    pub fn build<'a, I>(bets: I, winner: &ParticipantId) -> Self
    where
        I: IntoIterator<Item = &'a Bet>,
    {
        let bets: Vec<&Bet> = bets.into_iter().collect();

        let total_pot: Decimal = bets.iter().map(|b| b.amount).sum();
        let winning_pot: Decimal = bets
            .iter()
            .filter(|b| &b.participant == winner)
            .map(|b| b.amount)
            .sum();

        if winning_pot.is_zero() {
            return Self {
                total_pot,
                winning_pot,
                multiplier: None,
                lines: Vec::new(),
            };
        }

        let multiplier = total_pot / winning_pot;
        let lines = bets
            .iter()
            .filter(|b| &b.participant == winner)
            .map(|b| PayoutLine {
                bet_id: b.id,
                payout: (b.amount * multiplier)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            })
            .collect();

        Self {
            total_pot,
            winning_pot,
            multiplier: Some(multiplier),
            lines,
        }
    }

    /// Payout owed to a specific bet, if it backed the winner.
    pub fn payout_for(&self, bet_id: BetId) -> Option<Decimal> {
        self.lines
            .iter()
            .find(|l| l.bet_id == bet_id)
            .map(|l| l.payout)
    }

    /// Sum of all payout lines.
    pub fn total_payout(&self) -> Decimal {
        self.lines.iter().map(|l| l.payout).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::race::Bet;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn bet(participant: &str, amount: Decimal) -> Bet {
        Bet::pending(Uuid::new_v4(), Uuid::new_v4(), participant.into(), amount)
    }

    #[test]
    fn test_reference_scenario_350_over_150() {
        // A: 100 on H1, B: 50 on H1, C: 200 on H2; H1 wins.
        let a = bet("H1", dec!(100));
        let b = bet("H1", dec!(50));
        let c = bet("H2", dec!(200));
        let sheet = PayoutSheet::build([&a, &b, &c], &"H1".to_string());

        assert_eq!(sheet.total_pot, dec!(350));
        assert_eq!(sheet.winning_pot, dec!(150));
        assert_eq!(sheet.payout_for(a.id), Some(dec!(233.33)));
        assert_eq!(sheet.payout_for(b.id), Some(dec!(116.67)));
        assert_eq!(sheet.payout_for(c.id), None);
    }

    #[test]
    fn test_unbacked_winner_no_division_by_zero() {
        let a = bet("H2", dec!(75));
        let b = bet("H3", dec!(25));
        let sheet = PayoutSheet::build([&a, &b], &"H1".to_string());

        assert_eq!(sheet.total_pot, dec!(100));
        assert_eq!(sheet.winning_pot, dec!(0));
        assert_eq!(sheet.multiplier, None);
        assert!(sheet.lines.is_empty());
    }

    #[test]
    fn test_sole_winner_takes_whole_pot() {
        let a = bet("H1", dec!(40));
        let b = bet("H2", dec!(60));
        let sheet = PayoutSheet::build([&a, &b], &"H1".to_string());

        assert_eq!(sheet.multiplier, Some(dec!(2.5)));
        assert_eq!(sheet.payout_for(a.id), Some(dec!(100)));
        assert_eq!(sheet.total_payout(), dec!(100));
    }

    #[test]
    fn test_everyone_backed_winner_multiplier_is_one() {
        let a = bet("H1", dec!(10));
        let b = bet("H1", dec!(30));
        let sheet = PayoutSheet::build([&a, &b], &"H1".to_string());

        assert_eq!(sheet.multiplier, Some(dec!(1)));
        assert_eq!(sheet.payout_for(a.id), Some(dec!(10)));
        assert_eq!(sheet.payout_for(b.id), Some(dec!(30)));
    }

    #[test]
    fn test_no_bets_at_all() {
        let sheet = PayoutSheet::build([], &"H1".to_string());
        assert_eq!(sheet.total_pot, dec!(0));
        assert_eq!(sheet.multiplier, None);
        assert!(sheet.lines.is_empty());
    }

    #[test]
    fn test_rounding_stays_within_one_cent_per_winner() {
        // 3-way split of 100: 33.33 each, 0.01 retained by rounding.
        let bets: Vec<Bet> = (0..3).map(|_| bet("H1", dec!(10))).collect();
        let c = bet("H2", dec!(70));
        let mut all: Vec<&Bet> = bets.iter().collect();
        all.push(&c);
        let sheet = PayoutSheet::build(all, &"H1".to_string());

        assert_eq!(sheet.total_pot, dec!(100));
        let paid = sheet.total_payout();
        let drift = (sheet.total_pot - paid).abs();
        assert!(drift <= dec!(0.01) * Decimal::from(3));
    }
}
