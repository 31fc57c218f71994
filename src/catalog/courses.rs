//! Course administration.

use tracing::info;

use crate::domain::{Course, CourseDetail, CourseId, MaterialId, RecordState, SkillId};
use crate::error::{PortalError, Result};
use crate::reconcile::reconcile_links;
use crate::store::Gateway;

pub struct CourseCatalog<'a> {
    store: &'a mut dyn Gateway,
}

impl<'a> CourseCatalog<'a> {
    pub fn new(store: &'a mut dyn Gateway) -> Self {
        Self { store }
    }

    pub fn create(&mut self, title: &str, description: Option<&str>) -> Result<CourseId> {
        let id = self.store.insert_course(title, description)?;
        self.store.save_changes()?;
        info!(course_id = id, title, "course created");
        Ok(id)
    }

    pub fn list(&mut self) -> Result<Vec<Course>> {
        self.store.active_courses()
    }

    pub fn detail(&mut self, id: CourseId) -> Result<CourseDetail> {
        self.store
            .course_detail(id)?
            .ok_or(PortalError::CourseNotFound(id))
    }

    pub fn update(
        &mut self,
        id: CourseId,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let mut course = self.store.course(id)?.ok_or(PortalError::CourseNotFound(id))?;
        if let Some(title) = title {
            course.title = title.to_string();
        }
        if let Some(description) = description {
            course.description = Some(description.to_string());
        }
        self.store.update_course(&course)?;
        self.store.save_changes()?;
        Ok(())
    }

    /// Retire a course. Refused while any learner holds an enrollment for
    /// it, in progress or completed.
    pub fn remove(&mut self, id: CourseId) -> Result<()> {
        let mut course = self.store.course(id)?.ok_or(PortalError::CourseNotFound(id))?;

        if self.store.any_enrollment_by_course(id)? {
            return Err(PortalError::InvalidOperation(format!(
                "course {id} cannot be deleted because learners are already enrolled"
            )));
        }

        course.state = RecordState::Retired;
        self.store.update_course(&course)?;
        self.store.save_changes()?;
        info!(course_id = id, "course retired");
        Ok(())
    }

    /// Converge the course's material links to exactly `material_ids`.
    pub fn set_materials(&mut self, id: CourseId, material_ids: &[MaterialId]) -> Result<()> {
        let mut detail = self.detail(id)?;

        let missing = self.store.missing_materials(material_ids)?;
        if let Some(&first) = missing.first() {
            return Err(PortalError::MaterialNotFound(first));
        }

        let outcome = reconcile_links(&mut detail.material_links, material_ids);
        self.store.save_course_material_links(id, &detail.material_links)?;
        self.store.save_changes()?;
        info!(
            course_id = id,
            activated = outcome.activated,
            retired = outcome.retired,
            created = outcome.created,
            "course materials updated"
        );
        Ok(())
    }

    /// Converge the course's skill links to exactly `skill_ids`.
    pub fn set_skills(&mut self, id: CourseId, skill_ids: &[SkillId]) -> Result<()> {
        let mut detail = self.detail(id)?;

        let missing = self.store.missing_skills(skill_ids)?;
        if let Some(&first) = missing.first() {
            return Err(PortalError::SkillNotFound(first));
        }

        let outcome = reconcile_links(&mut detail.skill_links, skill_ids);
        self.store.save_course_skill_links(id, &detail.skill_links)?;
        self.store.save_changes()?;
        info!(
            course_id = id,
            activated = outcome.activated,
            retired = outcome.retired,
            created = outcome.created,
            "course skills updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{
        Enrollment, EnrollmentStatus, Learner, LearnerId, Material, MaterialDetails,
    };
    use crate::store::Database;

    fn open() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_video(db: &mut Database, title: &str) -> MaterialId {
        let id = db
            .insert_material(&Material {
                id: 0,
                title: title.into(),
                description: None,
                state: RecordState::Active,
                details: MaterialDetails::Video {
                    duration_sec: 60,
                    width_px: 640,
                    height_px: 480,
                },
            })
            .unwrap();
        db.save_changes().unwrap();
        id
    }

    #[test]
    fn create_update_and_list() {
        let mut db = open();
        let mut catalog = CourseCatalog::new(&mut db);

        let id = catalog.create("Rust", Some("intro")).unwrap();
        catalog.update(id, Some("Rust 2024"), None).unwrap();

        let courses = catalog.list().unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].title, "Rust 2024");
        assert_eq!(courses[0].description.as_deref(), Some("intro"));
    }

    #[test]
    fn update_unknown_course_is_not_found() {
        let mut db = open();
        let err = CourseCatalog::new(&mut db)
            .update(9, Some("x"), None)
            .unwrap_err();
        assert!(matches!(err, PortalError::CourseNotFound(9)));
    }

    #[test]
    fn remove_without_enrollments_retires_the_row() {
        let mut db = open();
        let mut catalog = CourseCatalog::new(&mut db);
        let id = catalog.create("Rust", None).unwrap();

        catalog.remove(id).unwrap();
        assert!(catalog.list().unwrap().is_empty());
        drop(catalog);

        // the row is retired, not deleted
        let course = db.course(id).unwrap().unwrap();
        assert_eq!(course.state, RecordState::Retired);
    }

    #[test]
    fn remove_with_enrollment_is_invalid() {
        let mut db = open();
        let learner = Learner {
            id: LearnerId::new(),
            name: "Ada".into(),
            created_at: Utc::now(),
        };
        db.insert_learner(&learner).unwrap();
        let course_id = db.insert_course("Rust", None).unwrap();
        db.insert_enrollment(&Enrollment {
            learner_id: learner.id,
            course_id,
            status: EnrollmentStatus::InProgress,
            progress_percent: 0,
            enrolled_at: Utc::now(),
        })
        .unwrap();
        db.save_changes().unwrap();

        let err = CourseCatalog::new(&mut db).remove(course_id).unwrap_err();
        assert!(matches!(err, PortalError::InvalidOperation(_)));
        assert_eq!(db.course(course_id).unwrap().unwrap().state, RecordState::Active);
    }

    #[test]
    fn set_materials_reconciles_and_persists() {
        let mut db = open();
        let a = add_video(&mut db, "a");
        let b = add_video(&mut db, "b");
        let c = add_video(&mut db, "c");

        let mut catalog = CourseCatalog::new(&mut db);
        let id = catalog.create("Rust", None).unwrap();

        catalog.set_materials(id, &[a, b]).unwrap();
        assert_eq!(catalog.detail(id).unwrap().active_material_ids(), vec![a, b]);

        // b drops out, c joins; b's row is kept retired
        catalog.set_materials(id, &[a, c]).unwrap();
        let detail = catalog.detail(id).unwrap();
        assert_eq!(detail.active_material_ids(), vec![a, c]);
        assert_eq!(detail.material_links.len(), 3);

        // b comes back without growing the table
        catalog.set_materials(id, &[a, b, c]).unwrap();
        let detail = catalog.detail(id).unwrap();
        assert_eq!(detail.active_material_ids(), vec![a, b, c]);
        assert_eq!(detail.material_links.len(), 3);
    }

    #[test]
    fn set_materials_rejects_unknown_material() {
        let mut db = open();
        let a = add_video(&mut db, "a");
        let mut catalog = CourseCatalog::new(&mut db);
        let id = catalog.create("Rust", None).unwrap();

        let err = catalog.set_materials(id, &[a, 999]).unwrap_err();
        assert!(matches!(err, PortalError::MaterialNotFound(999)));
        // nothing was linked
        assert!(catalog.detail(id).unwrap().material_links.is_empty());
    }

    #[test]
    fn set_skills_reconciles() {
        let mut db = open();
        let rust = db.insert_skill("Rust", None).unwrap();
        let sql = db.insert_skill("SQL", None).unwrap();
        db.save_changes().unwrap();

        let mut catalog = CourseCatalog::new(&mut db);
        let id = catalog.create("Backend", None).unwrap();

        catalog.set_skills(id, &[rust, sql]).unwrap();
        catalog.set_skills(id, &[sql]).unwrap();

        let detail = catalog.detail(id).unwrap();
        assert_eq!(detail.active_skill_ids(), vec![sql]);
        assert_eq!(detail.skill_links.len(), 2);
    }

    #[test]
    fn set_skills_rejects_unknown_skill() {
        let mut db = open();
        let mut catalog = CourseCatalog::new(&mut db);
        let id = catalog.create("Backend", None).unwrap();

        let err = catalog.set_skills(id, &[5]).unwrap_err();
        assert!(matches!(err, PortalError::SkillNotFound(5)));
    }

    #[test]
    fn set_materials_on_unknown_course_is_not_found() {
        let mut db = open();
        let err = CourseCatalog::new(&mut db).set_materials(3, &[]).unwrap_err();
        assert!(matches!(err, PortalError::CourseNotFound(3)));
    }
}
