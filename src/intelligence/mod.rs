pub mod entry_quality;
pub mod resolution;
pub mod win_rate;

pub use entry_quality::{score_entry, EntryInputs, EntryScore};
pub use resolution::{judge, ResolutionSpeed};
pub use win_rate::{estimate_win_rate, SettlementRecord};
