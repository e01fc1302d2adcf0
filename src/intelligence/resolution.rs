use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::MarketMeta;

/// How quickly a market is expected to resolve. Coordination alerts only
/// fire on fast-resolving markets, but `Unknown` is treated permissively
/// by the caller: a missed fast market costs more than a spurious alert
/// on a slow one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSpeed {
    Fast,
    Slow,
    Unknown,
}

impl ResolutionSpeed {
    /// The coordination gate passes unless the market is positively slow.
    pub fn allows_coordination(&self) -> bool {
        !matches!(self, ResolutionSpeed::Slow)
    }
}

impl fmt::Display for ResolutionSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSpeed::Fast => f.write_str("fast"),
            ResolutionSpeed::Slow => f.write_str("slow"),
            ResolutionSpeed::Unknown => f.write_str("unknown"),
        }
    }
}

/// Markets resolving within this many days count as fast.
const FAST_RESOLUTION_DAYS: i64 = 7;

/// Free-text markers of near-term resolution, matched case-insensitively
/// against the market title and description.
const FAST_KEYWORDS: &[&str] = &[
    "today",
    "tonight",
    "tomorrow",
    "this week",
    "this weekend",
    "next 24 hours",
    " vs ",
    " vs. ",
];

/// Judge resolution speed from market metadata.
///
/// The end date is authoritative when present; otherwise a keyword scan of
/// the title and description. No metadata or no extractable signal yields
/// `Unknown`.
pub fn judge(meta: Option<&MarketMeta>, now: DateTime<Utc>) -> ResolutionSpeed {
    let Some(meta) = meta else {
        return ResolutionSpeed::Unknown;
    };

    if let Some(end_date) = meta.end_date {
        let days_left = (end_date - now).num_days();
        return if days_left <= FAST_RESOLUTION_DAYS {
            ResolutionSpeed::Fast
        } else {
            ResolutionSpeed::Slow
        };
    }

    let text = format!(
        "{} {}",
        meta.title.as_deref().unwrap_or_default(),
        meta.description.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    if !text.trim().is_empty() && FAST_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return ResolutionSpeed::Fast;
    }

    ResolutionSpeed::Unknown
}
