//! Domain entities and value objects.
//!
//! Catalog entities (courses, materials, skills) are soft-deleted: their rows
//! carry a [`RecordState`] and are retired, never removed. Relationship rows
//! between them work the same way and are converged by the link reconciler.

mod link;
mod material;

pub use link::{LinkRecord, RecordState};
pub use material::{BookFormat, MaterialDetails, MaterialKind};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CourseId = i64;
pub type MaterialId = i64;
pub type SkillId = i64;

/// Opaque learner identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(pub Uuid);

impl LearnerId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LearnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LearnerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Learner {
    pub id: LearnerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub state: RecordState,
}

/// A course together with its relationship rows, the aggregate the
/// enrollment engine and the link edits operate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseDetail {
    pub course: Course,
    /// Links to materials; counterpart ids are material ids.
    pub material_links: Vec<LinkRecord>,
    /// Links to skills; counterpart ids are skill ids.
    pub skill_links: Vec<LinkRecord>,
}

impl CourseDetail {
    /// Distinct ids of actively linked materials, ascending.
    #[must_use]
    pub fn active_material_ids(&self) -> Vec<MaterialId> {
        active_counterpart_ids(&self.material_links)
    }

    /// Distinct ids of actively linked skills, ascending.
    #[must_use]
    pub fn active_skill_ids(&self) -> Vec<SkillId> {
        active_counterpart_ids(&self.skill_links)
    }
}

fn active_counterpart_ids(links: &[LinkRecord]) -> Vec<i64> {
    let mut ids: Vec<i64> = links
        .iter()
        .filter(|link| link.state.is_active())
        .map(|link| link.counterpart_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub id: MaterialId,
    pub title: String,
    pub description: Option<String>,
    pub state: RecordState,
    pub details: MaterialDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub description: Option<String>,
    pub state: RecordState,
}

/// Status stored on an enrollment row. Resolved against seeded reference
/// data once at store open; never compared by name at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    InProgress,
    Completed,
}

/// Answer to "where does this learner stand on this course?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentState {
    NotEnrolled,
    InProgress,
    Completed,
}

impl fmt::Display for EnrollmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEnrolled => write!(f, "not enrolled"),
            Self::InProgress => write!(f, "in progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// The learner-course relationship. Exactly one row per pair; once
/// `Completed` the status never reverts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub progress_percent: u8,
    pub enrolled_at: DateTime<Utc>,
}

/// The learner-material relationship; existence means the learner has
/// completed the material. Created at most once per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialCompletion {
    pub learner_id: LearnerId,
    pub material_id: MaterialId,
    pub completed_at: DateTime<Utc>,
}

/// The learner-skill relationship; `level` starts at 1 and is incremented
/// each time another course granting the same skill is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillAward {
    pub learner_id: LearnerId,
    pub skill_id: SkillId,
    pub level: u32,
    pub awarded_at: DateTime<Utc>,
}
