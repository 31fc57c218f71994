//! Persistence gateway consumed by the business-rule services.

use std::collections::HashSet;

use crate::domain::{
    BookFormat, Course, CourseDetail, CourseId, Enrollment, Learner, LearnerId, LinkRecord,
    Material, MaterialCompletion, MaterialId, Skill, SkillAward, SkillId,
};
use crate::error::Result;

/// Typed persistence boundary.
///
/// Writes join a pending unit of work and become durable only at
/// [`save_changes`](Gateway::save_changes); an implementation dropped with
/// unsaved writes must discard them. Lookups scoped "active" filter by record
/// state; plain lookups by id return retired rows too, matching the audit
/// trail the soft-delete scheme keeps.
pub trait Gateway {
    // ---- learners ----
    fn insert_learner(&mut self, learner: &Learner) -> Result<()>;
    fn learner(&mut self, id: LearnerId) -> Result<Option<Learner>>;
    fn learners(&mut self) -> Result<Vec<Learner>>;

    // ---- courses ----
    fn insert_course(&mut self, title: &str, description: Option<&str>) -> Result<CourseId>;
    fn course(&mut self, id: CourseId) -> Result<Option<Course>>;
    /// Course together with all of its material/skill link rows (both
    /// states; the reconciler needs the retired ones).
    fn course_detail(&mut self, id: CourseId) -> Result<Option<CourseDetail>>;
    fn active_courses(&mut self) -> Result<Vec<Course>>;
    fn update_course(&mut self, course: &Course) -> Result<()>;
    /// Ids from `ids` that have no course row at all.
    fn missing_courses(&mut self, ids: &[CourseId]) -> Result<Vec<CourseId>>;
    /// Whether any learner holds an enrollment for the course, regardless of
    /// its status.
    fn any_enrollment_by_course(&mut self, id: CourseId) -> Result<bool>;
    fn save_course_material_links(&mut self, id: CourseId, links: &[LinkRecord]) -> Result<()>;
    fn save_course_skill_links(&mut self, id: CourseId, links: &[LinkRecord]) -> Result<()>;

    // ---- materials ----
    fn insert_material(&mut self, material: &Material) -> Result<MaterialId>;
    fn material(&mut self, id: MaterialId) -> Result<Option<Material>>;
    fn active_materials(&mut self) -> Result<Vec<Material>>;
    fn update_material(&mut self, material: &Material) -> Result<()>;
    fn missing_materials(&mut self, ids: &[MaterialId]) -> Result<Vec<MaterialId>>;
    fn any_completion_by_material(&mut self, id: MaterialId) -> Result<bool>;
    /// Link rows of one material, counterpart ids being course ids.
    fn material_course_links(&mut self, id: MaterialId) -> Result<Vec<LinkRecord>>;
    fn save_material_course_links(&mut self, id: MaterialId, links: &[LinkRecord]) -> Result<()>;
    fn book_format(&mut self, id: i64) -> Result<Option<BookFormat>>;
    fn book_formats(&mut self) -> Result<Vec<BookFormat>>;

    // ---- skills ----
    fn insert_skill(&mut self, name: &str, description: Option<&str>) -> Result<SkillId>;
    fn skill(&mut self, id: SkillId) -> Result<Option<Skill>>;
    fn active_skills(&mut self) -> Result<Vec<Skill>>;
    fn update_skill(&mut self, skill: &Skill) -> Result<()>;
    fn missing_skills(&mut self, ids: &[SkillId]) -> Result<Vec<SkillId>>;
    fn any_award_by_skill(&mut self, id: SkillId) -> Result<bool>;
    /// Link rows of one skill, counterpart ids being course ids.
    fn skill_course_links(&mut self, id: SkillId) -> Result<Vec<LinkRecord>>;
    fn save_skill_course_links(&mut self, id: SkillId, links: &[LinkRecord]) -> Result<()>;

    // ---- enrollments ----
    fn enrollment(&mut self, learner: LearnerId, course: CourseId) -> Result<Option<Enrollment>>;
    fn insert_enrollment(&mut self, enrollment: &Enrollment) -> Result<()>;
    fn update_enrollment(&mut self, enrollment: &Enrollment) -> Result<()>;
    fn enrollments_for_learner(&mut self, learner: LearnerId) -> Result<Vec<Enrollment>>;

    // ---- material completions ----
    fn completion_exists(&mut self, learner: LearnerId, material: MaterialId) -> Result<bool>;
    fn insert_completion(&mut self, completion: &MaterialCompletion) -> Result<()>;
    fn completed_material_ids(&mut self, learner: LearnerId) -> Result<HashSet<MaterialId>>;

    // ---- skill awards ----
    fn award(&mut self, learner: LearnerId, skill: SkillId) -> Result<Option<SkillAward>>;
    fn insert_award(&mut self, award: &SkillAward) -> Result<()>;
    fn update_award(&mut self, award: &SkillAward) -> Result<()>;
    fn awards_for_learner(&mut self, learner: LearnerId) -> Result<Vec<SkillAward>>;

    /// Commit the pending unit of work. A no-op when nothing was written.
    fn save_changes(&mut self) -> Result<()>;
}
