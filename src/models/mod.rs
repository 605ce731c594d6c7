//! Data models

pub mod alert;
pub mod envelope;

pub use alert::{
    tally_counts, Alert, AlertSeverity, AlertStatus, HistoryEntry, SeverityCounts, StatusCounts,
};
pub use envelope::{render, AlertListing, ApiOutcome};
