use crate::error::SettlementError;

/// American odds are at least +100 or at most -100
pub fn validate_american_odds(odds: i32) -> Result<i32, SettlementError> {
    if odds >= 100 || odds <= -100 {
        Ok(odds)
    } else {
        Err(SettlementError::InvalidOdds(odds))
    }
}

/// Convert American odds to implied probability
/// Positive odds (+150) mean you win $150 on a $100 bet
/// Negative odds (-150) mean you need to bet $150 to win $100
pub fn american_odds_to_probability(odds: i32) -> f64 {
    if odds > 0 {
        // For positive odds: 100 / (odds + 100)
        100.0 / (odds as f64 + 100.0)
    } else {
        // For negative odds: |odds| / (|odds| + 100)
        let abs_odds = odds.unsigned_abs() as f64;
        abs_odds / (abs_odds + 100.0)
    }
}

/// Profit in cents paid on a winning stake, rounded down to the cent.
/// Does not include the returned stake.
pub fn potential_win(stake: i64, odds: i32) -> Result<i64, SettlementError> {
    if stake <= 0 {
        return Err(SettlementError::InvalidStake(stake));
    }
    validate_american_odds(odds)?;

    let odds = i64::from(odds);
    let win = if odds > 0 {
        stake.checked_mul(odds).map(|n| n / 100)
    } else {
        stake.checked_mul(100).map(|n| n / odds.abs())
    };
    win.ok_or_else(|| {
        SettlementError::AmountOverflow(format!("stake {} at {:+}", stake, odds))
    })
}
