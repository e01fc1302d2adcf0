use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Side;

/// One canonical executed fill, produced by the normalizer.
///
/// `identity` is the idempotency key: the venue transaction hash when the
/// feed provides one, otherwise a `syn:`-prefixed digest of
/// (wallet, market, amount, executed_at). The synthetic form can collide
/// for two genuinely distinct trades with identical fields in the same
/// second; that loss is accepted and logged rather than papered over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub identity: String,
    pub market_id: String,
    pub wallet: String,
    pub side: Side,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    pub fn has_synthetic_identity(&self) -> bool {
        self.identity.starts_with("syn:")
    }
}
