use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Financial fact kinds the engine understands.
///
/// Fact labels are free text in the store ("Net revenue", "net revenue",
/// "NET REVENUE"); they are resolved to this enum once, when the facts are read,
/// and every later computation matches on the enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum MetricKind {
    #[strum(serialize = "Net units")]
    Units,
    #[strum(serialize = "Net revenue")]
    Revenue,
    /// Contribution margin after marketing (CM3).
    #[strum(serialize = "CM3")]
    Margin,
}

impl MetricKind {
    /// Case-insensitive label lookup. Unknown labels (other margin tiers, fees,
    /// ad spend...) resolve to `None` and are ignored by the engine.
    pub fn from_label(label: &str) -> Option<Self> {
        let needle = label.trim();
        Self::iter().find(|kind| kind.label().eq_ignore_ascii_case(needle))
    }

    /// Canonical label written back to the store.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Units => "Net units",
            Self::Revenue => "Net revenue",
            Self::Margin => "CM3",
        }
    }
}

/// Metric label as grouped in the summary tables.
///
/// Summaries carry every imported label (other margin tiers, ad spend,
/// sessions...), not only the kinds the engine computes with. Labels match
/// trimmed and case-insensitively; known kinds are written under their
/// canonical label, any other label keeps the spelling it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetric {
    label: String,
    #[serde(skip)]
    key: String,
}

impl SummaryMetric {
    /// `None` for blank labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }
        let label = match MetricKind::from_label(trimmed) {
            Some(kind) => kind.label().to_string(),
            None => trimmed.to_string(),
        };
        Some(Self {
            key: label.to_lowercase(),
            label,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for SummaryMetric {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SummaryMetric {}

impl PartialOrd for SummaryMetric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SummaryMetric {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for SummaryMetric {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for SummaryMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
