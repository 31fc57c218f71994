//! Material variants.
//!
//! Materials form a closed set of kinds, each with its own attributes. The
//! store keeps them in one table discriminated by kind.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Video,
    Book,
    Article,
}

impl MaterialKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Book => "book",
            Self::Article => "article",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "video" => Some(Self::Video),
            "book" => Some(Self::Book),
            "article" => Some(Self::Article),
            _ => None,
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific attributes of a material.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialDetails {
    Video {
        duration_sec: u32,
        width_px: u32,
        height_px: u32,
    },
    Book {
        authors: String,
        pages: u32,
        format_id: i64,
        publication_year: i32,
    },
    Article {
        source_url: String,
        published_at: NaiveDate,
    },
}

impl MaterialDetails {
    #[must_use]
    pub const fn kind(&self) -> MaterialKind {
        match self {
            Self::Video { .. } => MaterialKind::Video,
            Self::Book { .. } => MaterialKind::Book,
            Self::Article { .. } => MaterialKind::Article,
        }
    }
}

/// Seeded reference row for book formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookFormat {
    pub id: i64,
    pub name: String,
}
