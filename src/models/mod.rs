pub mod alert;
pub mod market;
pub mod trade;
pub mod wallet;

pub use alert::{
    Alert, AlertKind, CoordinatedPayload, NewAlert, TrackedWalletPayload, VolumeSpikePayload,
    WhalePayload,
};
pub use market::{MarketContext, MarketMeta};
pub use trade::Trade;
pub use wallet::{TrackedWallet, WalletStats};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Binary outcome label for a fill. Feeds that omit or mangle the field
/// degrade to `Unknown` instead of failing normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
    Unknown,
}

impl Side {
    pub fn from_api_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "YES" | "0" => Side::Yes,
            "NO" | "1" => Side::No,
            _ => Side::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "YES",
            Side::No => "NO",
            Side::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_from_api_str() {
        assert_eq!(Side::from_api_str("yes"), Side::Yes);
        assert_eq!(Side::from_api_str("0"), Side::Yes);
        assert_eq!(Side::from_api_str("NO"), Side::No);
        assert_eq!(Side::from_api_str("1"), Side::No);
        assert_eq!(Side::from_api_str("maybe"), Side::Unknown);
        assert_eq!(Side::from_api_str(""), Side::Unknown);
    }
}
