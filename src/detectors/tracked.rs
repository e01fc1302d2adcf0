use std::collections::HashMap;

use crate::models::{Trade, TrackedWalletPayload};

/// One alert per admitted trade whose wallet is in the registered tracked
/// set. A trade that also qualifies as a whale alerts under both kinds by
/// design; they are different signals, not redundant dedup.
pub fn detect(
    batch: &[Trade],
    tracked: &HashMap<String, Option<String>>,
) -> Vec<(String, TrackedWalletPayload)> {
    batch
        .iter()
        .filter_map(|trade| {
            let nickname = tracked.get(&trade.wallet)?;
            Some((
                trade.market_id.clone(),
                TrackedWalletPayload {
                    wallet: trade.wallet.clone(),
                    nickname: nickname.clone(),
                    side: trade.side,
                    amount: trade.amount,
                    trade_identity: trade.identity.clone(),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn trade(wallet: &str, identity: &str) -> Trade {
        Trade {
            identity: identity.into(),
            market_id: "m1".into(),
            wallet: wallet.into(),
            side: Side::Yes,
            amount: Decimal::from(50),
            price: None,
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_tracked_wallets_alert() {
        let tracked = HashMap::from([
            ("0xfollowed".to_string(), Some("MyWhale".to_string())),
        ]);
        let batch = vec![trade("0xfollowed", "t1"), trade("0xother", "t2")];

        let alerts = detect(&batch, &tracked);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].1.wallet, "0xfollowed");
        assert_eq!(alerts[0].1.nickname.as_deref(), Some("MyWhale"));
        assert_eq!(alerts[0].1.trade_identity, "t1");
    }

    #[test]
    fn test_empty_tracked_set_yields_nothing() {
        let batch = vec![trade("0xa", "t1"), trade("0xb", "t2")];
        assert!(detect(&batch, &HashMap::new()).is_empty());
    }
}
