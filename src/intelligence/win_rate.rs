use rust_decimal::Decimal;

/// Settlement tallies for a wallet, when the settlement ledger has data.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementRecord {
    pub wins: i64,
    pub losses: i64,
}

/// Ordered volume tiers for the heuristic win-rate estimate:
/// (min total volume exclusive, estimated win-rate pct). Wallets that have
/// moved more money tend to be sharper; this stands in until real
/// settlement data accumulates.
const VOLUME_WIN_RATE_TIERS: &[(i64, i64)] = &[(5_000, 75), (2_000, 65), (500, 55)];

/// Estimate a wallet's win rate as a percentage in [0, 100].
///
/// Settlement-derived when the ledger has any resolved outcome for the
/// wallet; otherwise falls back to the volume-tier table.
pub fn estimate_win_rate(total_volume: Decimal, settlement: Option<&SettlementRecord>) -> Decimal {
    if let Some(record) = settlement {
        let resolved = record.wins + record.losses;
        if resolved > 0 {
            return Decimal::from(record.wins * 100) / Decimal::from(resolved);
        }
    }

    VOLUME_WIN_RATE_TIERS
        .iter()
        .find(|(min, _)| total_volume > Decimal::from(*min))
        .map(|(_, rate)| Decimal::from(*rate))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_data_wins_over_heuristic() {
        let record = SettlementRecord { wins: 3, losses: 1 };
        let rate = estimate_win_rate(Decimal::from(10_000), Some(&record));
        assert_eq!(rate, Decimal::from(75));
    }

    #[test]
    fn test_empty_settlement_falls_back_to_volume_tiers() {
        let record = SettlementRecord { wins: 0, losses: 0 };
        let rate = estimate_win_rate(Decimal::from(6_000), Some(&record));
        assert_eq!(rate, Decimal::from(75));
    }

    #[test]
    fn test_volume_tiers() {
        let cases = [
            (6_000, 75),
            (5_000, 65), // boundary is exclusive
            (2_500, 65),
            (600, 55),
            (500, 0),
            (0, 0),
        ];
        for (volume, expected) in cases {
            assert_eq!(
                estimate_win_rate(Decimal::from(volume), None),
                Decimal::from(expected),
                "volume {volume}"
            );
        }
    }
}
