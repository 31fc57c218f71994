//! Enrollment state machine.
//!
//! Drives a learner's path through a course: `NotEnrolled -> InProgress ->
//! Completed`, with `Completed` terminal. Progress is recomputed from the
//! course's full active material set on every touch, which keeps the stored
//! percent honest after the course's material links change.

pub mod awards;

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{
    CourseDetail, CourseId, Enrollment, EnrollmentState, EnrollmentStatus, LearnerId,
    MaterialCompletion, MaterialId,
};
use crate::error::{PortalError, Result};
use crate::progress::{self, MAX_PROGRESS_PERCENT};
use crate::store::Gateway;

use awards::award_course_skills;

/// Enrollment, progress, and completion operations for one store.
pub struct EnrollmentService<'a> {
    store: &'a mut dyn Gateway,
}

impl<'a> EnrollmentService<'a> {
    pub fn new(store: &'a mut dyn Gateway) -> Self {
        Self { store }
    }

    /// Enroll a learner in a course.
    ///
    /// Re-enrolling is safe: a Completed enrollment is left alone (silent
    /// success, nothing saved), an InProgress one gets its percent
    /// recomputed against the course's current material set.
    pub fn enroll(&mut self, learner_id: LearnerId, course_id: CourseId) -> Result<()> {
        self.require_learner(learner_id)?;
        let course = self.require_course(course_id)?;

        if let Some(mut enrollment) = self.store.enrollment(learner_id, course_id)? {
            if enrollment.status == EnrollmentStatus::Completed {
                debug!(%learner_id, course_id, "already completed, enroll is a no-op");
                return Ok(());
            }

            enrollment.progress_percent = self.current_percent(learner_id, &course)?;
            self.store.update_enrollment(&enrollment)?;
            self.store.save_changes()?;
            debug!(
                %learner_id,
                course_id,
                percent = enrollment.progress_percent,
                "re-enrolled, progress refreshed"
            );
            return Ok(());
        }

        let enrollment = Enrollment {
            learner_id,
            course_id,
            status: EnrollmentStatus::InProgress,
            progress_percent: self.current_percent(learner_id, &course)?,
            enrolled_at: Utc::now(),
        };
        self.store.insert_enrollment(&enrollment)?;
        self.store.save_changes()?;
        info!(%learner_id, course_id, percent = enrollment.progress_percent, "enrolled");
        Ok(())
    }

    /// Record that a learner finished a material, then refresh every
    /// enrollment the material feeds into.
    ///
    /// The completion itself is saved first; each affected course then gets
    /// its own save cycle, so a later failure never takes an earlier
    /// course's update down with it.
    pub fn mark_material_complete(
        &mut self,
        learner_id: LearnerId,
        material_id: MaterialId,
    ) -> Result<()> {
        self.require_learner(learner_id)?;
        self.store
            .material(material_id)?
            .ok_or(PortalError::MaterialNotFound(material_id))?;

        if !self.store.completion_exists(learner_id, material_id)? {
            self.store.insert_completion(&MaterialCompletion {
                learner_id,
                material_id,
                completed_at: Utc::now(),
            })?;
            self.store.save_changes()?;
            info!(%learner_id, material_id, "material completed");
        }

        let links = self.store.material_course_links(material_id)?;
        let mut affected: Vec<CourseId> = links
            .iter()
            .filter(|link| link.state.is_active())
            .map(|link| link.counterpart_id)
            .collect();
        affected.sort_unstable();
        affected.dedup();

        for course_id in affected {
            let Some(enrollment) = self.store.enrollment(learner_id, course_id)? else {
                // completing a material outside any enrollment has no
                // progress side effect
                continue;
            };
            self.refresh_enrollment(learner_id, course_id, enrollment)?;
        }

        Ok(())
    }

    /// Explicitly complete a course for a learner, regardless of progress.
    pub fn complete_course(&mut self, learner_id: LearnerId, course_id: CourseId) -> Result<()> {
        let Some(mut enrollment) = self.store.enrollment(learner_id, course_id)? else {
            return Err(PortalError::EnrollmentNotFound {
                learner_id: learner_id.0,
                course_id,
            });
        };

        if enrollment.status == EnrollmentStatus::Completed {
            debug!(%learner_id, course_id, "already completed, nothing to do");
            return Ok(());
        }

        let course = self.require_course(course_id)?;

        enrollment.status = EnrollmentStatus::Completed;
        enrollment.progress_percent = MAX_PROGRESS_PERCENT;
        self.store.update_enrollment(&enrollment)?;
        award_course_skills(&mut *self.store, learner_id, &course)?;
        self.store.save_changes()?;
        info!(%learner_id, course_id, "course completed");
        Ok(())
    }

    /// Where the learner stands on the course.
    pub fn status(&mut self, learner_id: LearnerId, course_id: CourseId) -> Result<EnrollmentState> {
        Ok(match self.store.enrollment(learner_id, course_id)? {
            None => EnrollmentState::NotEnrolled,
            Some(enrollment) if enrollment.status == EnrollmentStatus::Completed => {
                EnrollmentState::Completed
            }
            Some(_) => EnrollmentState::InProgress,
        })
    }

    /// Ids of every material the learner has completed.
    pub fn completed_material_ids(&mut self, learner_id: LearnerId) -> Result<HashSet<MaterialId>> {
        self.store.completed_material_ids(learner_id)
    }

    fn refresh_enrollment(
        &mut self,
        learner_id: LearnerId,
        course_id: CourseId,
        mut enrollment: Enrollment,
    ) -> Result<()> {
        let course = self.require_course(course_id)?;
        let percent = self.current_percent(learner_id, &course)?;
        enrollment.progress_percent = percent;

        if percent >= MAX_PROGRESS_PERCENT && enrollment.status != EnrollmentStatus::Completed {
            enrollment.status = EnrollmentStatus::Completed;
            self.store.update_enrollment(&enrollment)?;
            award_course_skills(&mut *self.store, learner_id, &course)?;
            self.store.save_changes()?;
            info!(%learner_id, course_id, "course completed through material progress");
            return Ok(());
        }

        self.store.update_enrollment(&enrollment)?;
        self.store.save_changes()?;
        debug!(%learner_id, course_id, percent, "progress updated");
        Ok(())
    }

    fn current_percent(&mut self, learner_id: LearnerId, course: &CourseDetail) -> Result<u8> {
        let active = course.active_material_ids();
        let completed = self.store.completed_material_ids(learner_id)?;
        Ok(progress::percent_complete(&active, &completed))
    }

    fn require_learner(&mut self, learner_id: LearnerId) -> Result<()> {
        self.store
            .learner(learner_id)?
            .ok_or(PortalError::LearnerNotFound(learner_id.0))?;
        Ok(())
    }

    fn require_course(&mut self, course_id: CourseId) -> Result<CourseDetail> {
        self.store
            .course_detail(course_id)?
            .ok_or(PortalError::CourseNotFound(course_id))
    }
}
