//! Soft-deleted relationship rows.

use serde::Serialize;

/// Active/Retired flag on soft-deleted rows. Retired rows are kept for
/// history and can be re-activated, never hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Active,
    Retired,
}

impl RecordState {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Retired => "retired",
        }
    }

    /// Parse the stored representation; `None` for anything unknown.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "retired" => Some(Self::Retired),
            _ => None,
        }
    }
}

/// A relationship row as seen from one owner entity: the other side's id
/// plus the row's record state. The store scopes queries to an owner and a
/// direction, so the same table row can surface with either of its two ids
/// as the counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    pub counterpart_id: i64,
    pub state: RecordState,
}

impl LinkRecord {
    #[must_use]
    pub const fn active(counterpart_id: i64) -> Self {
        Self {
            counterpart_id,
            state: RecordState::Active,
        }
    }
}
