use serde::Deserialize;
use serde_json::Value;

/// Known historical payload shapes for one executed fill, tried in order.
/// Anything that fits neither known shape lands in `Opaque` and goes
/// through best-effort field extraction instead of being dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFill {
    Nested(FillNested),
    Flat(FillFlat),
    Opaque(Value),
}

/// Newer nested shape: `market.id`, `taker.signer`, `taker.outcome.name`.
/// Amounts are already in human currency units.
#[derive(Debug, Clone, Deserialize)]
pub struct FillNested {
    #[serde(default)]
    pub hash: Option<String>,
    pub market: MarketRef,
    pub taker: TakerRef,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default, alias = "executedAt")]
    pub executed_at: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketRef {
    pub id: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TakerRef {
    pub signer: String,
    #[serde(default)]
    pub outcome: Option<OutcomeRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutcomeRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// Older flat shape: top-level `tokenId` / `taker` / `side` /
/// `takerAmount`, with amounts in 1e18 base units.
#[derive(Debug, Clone, Deserialize)]
pub struct FillFlat {
    #[serde(default, alias = "transactionHash")]
    pub transaction_hash: Option<String>,
    #[serde(alias = "tokenId")]
    pub token_id: Value,
    #[serde(default)]
    pub taker: Option<Value>,
    #[serde(default)]
    pub side: Option<Value>,
    #[serde(alias = "takerAmount")]
    pub taker_amount: Value,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default, alias = "executedAt")]
    pub executed_at: Option<Value>,
}

/// Market detail payload from the venue, fields all optional by design.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMarketDetail {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "question")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "endDate", alias = "end_date_iso")]
    pub end_date: Option<Value>,
    #[serde(default, alias = "yesPrice")]
    pub yes_price: Option<Value>,
}
