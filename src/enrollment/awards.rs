//! Skill awards granted on course completion.

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{CourseDetail, LearnerId, SkillAward};
use crate::error::Result;
use crate::store::Gateway;

/// Grant the course's actively linked skills to the learner.
///
/// First grant of a skill creates a level-1 award; every further grant
/// increments the level, uncapped. A link pointing at a skill row that no
/// longer exists is skipped rather than failing the completion. Skills are
/// processed in ascending id order. Writes join the caller's unit of work;
/// nothing is committed here.
pub fn award_course_skills(
    store: &mut dyn Gateway,
    learner_id: LearnerId,
    course: &CourseDetail,
) -> Result<()> {
    for skill_id in course.active_skill_ids() {
        if store.skill(skill_id)?.is_none() {
            debug!(skill_id, "skill link points at a removed skill, skipping award");
            continue;
        }

        match store.award(learner_id, skill_id)? {
            None => {
                store.insert_award(&SkillAward {
                    learner_id,
                    skill_id,
                    level: 1,
                    awarded_at: Utc::now(),
                })?;
                info!(%learner_id, skill_id, "skill awarded at level 1");
            }
            Some(mut award) => {
                award.level += 1;
                store.update_award(&award)?;
                info!(%learner_id, skill_id, level = award.level, "skill level raised");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{Course, Learner, LinkRecord, RecordState};
    use crate::store::Database;

    fn setup() -> (Database, LearnerId) {
        let mut db = Database::open_in_memory().unwrap();
        let learner = Learner {
            id: LearnerId::new(),
            name: "Ada".into(),
            created_at: Utc::now(),
        };
        db.insert_learner(&learner).unwrap();
        db.save_changes().unwrap();
        (db, learner.id)
    }

    fn detail_with_skills(db: &mut Database, skill_ids: &[i64]) -> CourseDetail {
        let course_id = db.insert_course("Rust", None).unwrap();
        let links: Vec<LinkRecord> = skill_ids.iter().map(|&s| LinkRecord::active(s)).collect();
        db.save_course_skill_links(course_id, &links).unwrap();
        db.save_changes().unwrap();
        CourseDetail {
            course: Course {
                id: course_id,
                title: "Rust".into(),
                description: None,
                state: RecordState::Active,
            },
            material_links: Vec::new(),
            skill_links: links,
        }
    }

    #[test]
    fn first_grant_creates_level_one() {
        let (mut db, learner) = setup();
        let skill_id = db.insert_skill("Rust", None).unwrap();
        let detail = detail_with_skills(&mut db, &[skill_id]);

        award_course_skills(&mut db, learner, &detail).unwrap();
        db.save_changes().unwrap();

        let award = db.award(learner, skill_id).unwrap().unwrap();
        assert_eq!(award.level, 1);
    }

    #[test]
    fn repeat_grant_increments_level() {
        let (mut db, learner) = setup();
        let skill_id = db.insert_skill("Rust", None).unwrap();
        let first = detail_with_skills(&mut db, &[skill_id]);
        let second = detail_with_skills(&mut db, &[skill_id]);

        award_course_skills(&mut db, learner, &first).unwrap();
        award_course_skills(&mut db, learner, &second).unwrap();
        db.save_changes().unwrap();

        let award = db.award(learner, skill_id).unwrap().unwrap();
        assert_eq!(award.level, 2, "one record, accumulated level");
        assert_eq!(db.awards_for_learner(learner).unwrap().len(), 1);
    }

    #[test]
    fn retired_links_grant_nothing() {
        let (mut db, learner) = setup();
        let skill_id = db.insert_skill("Rust", None).unwrap();
        let mut detail = detail_with_skills(&mut db, &[skill_id]);
        detail.skill_links[0].state = RecordState::Retired;

        award_course_skills(&mut db, learner, &detail).unwrap();
        db.save_changes().unwrap();

        assert!(db.award(learner, skill_id).unwrap().is_none());
    }

    #[test]
    fn link_to_removed_skill_is_skipped() {
        let (mut db, learner) = setup();
        let real = db.insert_skill("Rust", None).unwrap();
        db.save_changes().unwrap();

        // a link whose skill row was hard-removed out of band
        let detail = CourseDetail {
            course: Course {
                id: 1,
                title: "Rust".into(),
                description: None,
                state: RecordState::Active,
            },
            material_links: Vec::new(),
            skill_links: vec![LinkRecord::active(real), LinkRecord::active(9999)],
        };

        award_course_skills(&mut db, learner, &detail).unwrap();
        db.save_changes().unwrap();

        assert!(db.award(learner, real).unwrap().is_some());
        assert!(db.award(learner, 9999).unwrap().is_none());
    }
}
