//! Learner profile: the read side of enrollment tracking.

use serde::Serialize;

use crate::domain::{CourseId, EnrollmentStatus, Learner, LearnerId, SkillId};
use crate::error::{PortalError, Result};
use crate::store::Gateway;

#[derive(Debug, Clone, Serialize)]
pub struct CourseProgressItem {
    pub course_id: CourseId,
    pub title: String,
    pub progress_percent: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillLevelItem {
    pub skill_id: SkillId,
    pub name: String,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LearnerProfile {
    pub learner: Learner,
    pub in_progress: Vec<CourseProgressItem>,
    pub completed: Vec<CourseProgressItem>,
    pub skills: Vec<SkillLevelItem>,
}

pub struct ProfileService<'a> {
    store: &'a mut dyn Gateway,
}

impl<'a> ProfileService<'a> {
    pub fn new(store: &'a mut dyn Gateway) -> Self {
        Self { store }
    }

    /// Everything worth showing about one learner: enrollments split by
    /// status, plus accumulated skills. Rows pointing at entities removed
    /// out of band are skipped rather than failing the whole profile.
    pub fn profile(&mut self, learner_id: LearnerId) -> Result<LearnerProfile> {
        let learner = self
            .store
            .learner(learner_id)?
            .ok_or(PortalError::LearnerNotFound(learner_id.0))?;

        let mut in_progress = Vec::new();
        let mut completed = Vec::new();
        for enrollment in self.store.enrollments_for_learner(learner_id)? {
            let Some(course) = self.store.course(enrollment.course_id)? else {
                continue;
            };
            let item = CourseProgressItem {
                course_id: course.id,
                title: course.title,
                progress_percent: enrollment.progress_percent,
            };
            match enrollment.status {
                EnrollmentStatus::InProgress => in_progress.push(item),
                EnrollmentStatus::Completed => completed.push(item),
            }
        }

        let mut skills = Vec::new();
        for award in self.store.awards_for_learner(learner_id)? {
            let Some(skill) = self.store.skill(award.skill_id)? else {
                continue;
            };
            skills.push(SkillLevelItem {
                skill_id: skill.id,
                name: skill.name,
                level: award.level,
            });
        }

        Ok(LearnerProfile {
            learner,
            in_progress,
            completed,
            skills,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{Enrollment, Learner, SkillAward};
    use crate::store::Database;

    #[test]
    fn profile_splits_courses_by_status_and_lists_skills() {
        let mut db = Database::open_in_memory().unwrap();
        let learner = Learner {
            id: LearnerId::new(),
            name: "Ada".into(),
            created_at: Utc::now(),
        };
        db.insert_learner(&learner).unwrap();

        let running = db.insert_course("Rust", None).unwrap();
        let finished = db.insert_course("SQL", None).unwrap();
        let skill_id = db.insert_skill("Databases", None).unwrap();

        db.insert_enrollment(&Enrollment {
            learner_id: learner.id,
            course_id: running,
            status: EnrollmentStatus::InProgress,
            progress_percent: 40,
            enrolled_at: Utc::now(),
        })
        .unwrap();
        db.insert_enrollment(&Enrollment {
            learner_id: learner.id,
            course_id: finished,
            status: EnrollmentStatus::Completed,
            progress_percent: 100,
            enrolled_at: Utc::now(),
        })
        .unwrap();
        db.insert_award(&SkillAward {
            learner_id: learner.id,
            skill_id,
            level: 2,
            awarded_at: Utc::now(),
        })
        .unwrap();
        db.save_changes().unwrap();

        let profile = ProfileService::new(&mut db).profile(learner.id).unwrap();

        assert_eq!(profile.learner.name, "Ada");
        assert_eq!(profile.in_progress.len(), 1);
        assert_eq!(profile.in_progress[0].progress_percent, 40);
        assert_eq!(profile.completed.len(), 1);
        assert_eq!(profile.completed[0].title, "SQL");
        assert_eq!(profile.skills.len(), 1);
        assert_eq!(profile.skills[0].level, 2);
    }

    #[test]
    fn profile_for_unknown_learner_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        let err = ProfileService::new(&mut db)
            .profile(LearnerId::new())
            .unwrap_err();
        assert!(matches!(err, PortalError::LearnerNotFound(_)));
    }
}
