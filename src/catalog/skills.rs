//! Skill administration.

use tracing::info;

use crate::domain::{CourseId, RecordState, Skill, SkillId};
use crate::error::{PortalError, Result};
use crate::reconcile::reconcile_links;
use crate::store::Gateway;

pub struct SkillCatalog<'a> {
    store: &'a mut dyn Gateway,
}

impl<'a> SkillCatalog<'a> {
    pub fn new(store: &'a mut dyn Gateway) -> Self {
        Self { store }
    }

    pub fn create(&mut self, name: &str, description: Option<&str>) -> Result<SkillId> {
        let id = self.store.insert_skill(name, description)?;
        self.store.save_changes()?;
        info!(skill_id = id, name, "skill created");
        Ok(id)
    }

    pub fn list(&mut self) -> Result<Vec<Skill>> {
        self.store.active_skills()
    }

    pub fn update(
        &mut self,
        id: SkillId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let mut skill = self.store.skill(id)?.ok_or(PortalError::SkillNotFound(id))?;
        if let Some(name) = name {
            skill.name = name.to_string();
        }
        if let Some(description) = description {
            skill.description = Some(description.to_string());
        }
        self.store.update_skill(&skill)?;
        self.store.save_changes()?;
        Ok(())
    }

    /// Retire a skill. Refused once it has been awarded to any learner.
    pub fn remove(&mut self, id: SkillId) -> Result<()> {
        let mut skill = self.store.skill(id)?.ok_or(PortalError::SkillNotFound(id))?;

        if self.store.any_award_by_skill(id)? {
            return Err(PortalError::InvalidOperation(format!(
                "skill {id} cannot be deleted because it has already been awarded to learners"
            )));
        }

        skill.state = RecordState::Retired;
        self.store.update_skill(&skill)?;
        self.store.save_changes()?;
        info!(skill_id = id, "skill retired");
        Ok(())
    }

    /// Ids of courses actively granting this skill, ascending.
    pub fn assigned_course_ids(&mut self, id: SkillId) -> Result<Vec<CourseId>> {
        self.store.skill(id)?.ok_or(PortalError::SkillNotFound(id))?;
        let links = self.store.skill_course_links(id)?;
        let mut ids: Vec<CourseId> = links
            .iter()
            .filter(|link| link.state.is_active())
            .map(|link| link.counterpart_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Converge the skill's course links to exactly `course_ids`.
    pub fn set_courses(&mut self, id: SkillId, course_ids: &[CourseId]) -> Result<()> {
        self.store.skill(id)?.ok_or(PortalError::SkillNotFound(id))?;

        let missing = self.store.missing_courses(course_ids)?;
        if let Some(&first) = missing.first() {
            return Err(PortalError::CourseNotFound(first));
        }

        let mut links = self.store.skill_course_links(id)?;
        let outcome = reconcile_links(&mut links, course_ids);
        self.store.save_skill_course_links(id, &links)?;
        self.store.save_changes()?;
        info!(
            skill_id = id,
            activated = outcome.activated,
            retired = outcome.retired,
            created = outcome.created,
            "skill courses updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{Learner, LearnerId, SkillAward};
    use crate::store::Database;

    fn open() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn create_update_list() {
        let mut db = open();
        let mut catalog = SkillCatalog::new(&mut db);

        let id = catalog.create("Rust", None).unwrap();
        catalog.update(id, None, Some("systems programming")).unwrap();

        let skills = catalog.list().unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].description.as_deref(), Some("systems programming"));
    }

    #[test]
    fn remove_awarded_skill_is_invalid() {
        let mut db = open();
        let learner = Learner {
            id: LearnerId::new(),
            name: "Ada".into(),
            created_at: Utc::now(),
        };
        db.insert_learner(&learner).unwrap();
        let skill_id = db.insert_skill("Rust", None).unwrap();
        db.insert_award(&SkillAward {
            learner_id: learner.id,
            skill_id,
            level: 1,
            awarded_at: Utc::now(),
        })
        .unwrap();
        db.save_changes().unwrap();

        let err = SkillCatalog::new(&mut db).remove(skill_id).unwrap_err();
        assert!(matches!(err, PortalError::InvalidOperation(_)));
    }

    #[test]
    fn remove_unawarded_skill_retires_it() {
        let mut db = open();
        let mut catalog = SkillCatalog::new(&mut db);
        let id = catalog.create("Rust", None).unwrap();

        catalog.remove(id).unwrap();
        assert!(catalog.list().unwrap().is_empty());
    }

    #[test]
    fn set_courses_reconciles_from_the_skill_side() {
        let mut db = open();
        let rust = db.insert_course("Rust", None).unwrap();
        let advanced = db.insert_course("Advanced Rust", None).unwrap();
        db.save_changes().unwrap();

        let mut catalog = SkillCatalog::new(&mut db);
        let id = catalog.create("Rust", None).unwrap();

        catalog.set_courses(id, &[rust, advanced]).unwrap();
        assert_eq!(catalog.assigned_course_ids(id).unwrap(), vec![rust, advanced]);

        catalog.set_courses(id, &[advanced]).unwrap();
        assert_eq!(catalog.assigned_course_ids(id).unwrap(), vec![advanced]);
        drop(catalog);

        let detail = db.course_detail(rust).unwrap().unwrap();
        assert_eq!(detail.skill_links.len(), 1);
        assert!(detail.active_skill_ids().is_empty());
    }

    #[test]
    fn set_courses_unknown_skill_is_not_found() {
        let mut db = open();
        let err = SkillCatalog::new(&mut db).set_courses(8, &[]).unwrap_err();
        assert!(matches!(err, PortalError::SkillNotFound(8)));
    }
}
