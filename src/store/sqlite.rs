//! SQLite database layer

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::domain::{
    BookFormat, Course, CourseDetail, CourseId, Enrollment, EnrollmentStatus, Learner, LearnerId,
    LinkRecord, Material, MaterialCompletion, MaterialDetails, MaterialId, RecordState, Skill,
    SkillAward, SkillId,
};
use crate::error::{PortalError, Result};
use crate::store::migrations;
use crate::store::Gateway;

/// Row ids of the seeded enrollment statuses, resolved once at open.
#[derive(Debug, Clone, Copy)]
struct StatusIds {
    in_progress: i64,
    completed: i64,
}

/// SQLite-backed portal store.
///
/// Writes open an implicit transaction on first use; `save_changes` commits
/// it. Dropping the store with an open transaction rolls it back, so nothing
/// uncommitted ever becomes visible.
pub struct Database {
    conn: Connection,
    statuses: StatusIds,
    schema_version: u32,
    in_tx: bool,
    commits: u64,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schema_version", &self.schema_version)
            .field("in_tx", &self.in_tx)
            .finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if self.in_tx {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

impl Database {
    /// Open (and migrate) the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_pragmas(&conn)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let schema_version = migrations::run_migrations(&conn)?;
        let statuses = resolve_statuses(&conn)?;
        Ok(Self {
            conn,
            statuses,
            schema_version,
            in_tx: false,
            commits: 0,
        })
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        // journal_mode returns the resulting mode as a row
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        Ok(())
    }

    /// Current schema version after migrations.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Number of committed units of work since open.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    fn begin(&mut self) -> Result<()> {
        if !self.in_tx {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
            self.in_tx = true;
        }
        Ok(())
    }

    const fn status_id(&self, status: EnrollmentStatus) -> i64 {
        match status {
            EnrollmentStatus::InProgress => self.statuses.in_progress,
            EnrollmentStatus::Completed => self.statuses.completed,
        }
    }

    fn status_from_id(&self, id: i64) -> Result<EnrollmentStatus> {
        if id == self.statuses.in_progress {
            Ok(EnrollmentStatus::InProgress)
        } else if id == self.statuses.completed {
            Ok(EnrollmentStatus::Completed)
        } else {
            Err(PortalError::Integrity(format!(
                "enrollment references unknown status id {id}"
            )))
        }
    }

    fn link_records(&mut self, sql: &str, owner: i64) -> Result<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map([owner], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut links = Vec::new();
        for row in rows {
            let (counterpart_id, state) = row?;
            links.push(LinkRecord {
                counterpart_id,
                state: parse_state(&state)?,
            });
        }
        Ok(links)
    }

    fn save_links(&mut self, sql: &str, owner: i64, links: &[LinkRecord]) -> Result<()> {
        self.begin()?;
        let mut stmt = self.conn.prepare_cached(sql)?;
        for link in links {
            stmt.execute(params![owner, link.counterpart_id, link.state.as_str()])?;
        }
        Ok(())
    }

    fn missing_ids(&mut self, table: &str, ids: &[i64]) -> Result<Vec<i64>> {
        let sql = format!("SELECT 1 FROM {table} WHERE id = ?1");
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let mut missing = Vec::new();
        for &id in ids {
            let found = stmt
                .query_row([id], |_| Ok(()))
                .optional()?
                .is_some();
            if !found {
                missing.push(id);
            }
        }
        missing.sort_unstable();
        missing.dedup();
        Ok(missing)
    }

    fn exists(&mut self, sql: &str, id: i64) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.query_row([id], |_| Ok(())).optional()?.is_some())
    }
}

impl Gateway for Database {
    // ---- learners ----

    fn insert_learner(&mut self, learner: &Learner) -> Result<()> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO learners (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![
                learner.id.to_string(),
                learner.name,
                learner.created_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn learner(&mut self, id: LearnerId) -> Result<Option<Learner>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM learners WHERE id = ?1",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, created_at)| {
            Ok(Learner {
                id: parse_learner_id(&id)?,
                name,
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .transpose()
    }

    fn learners(&mut self) -> Result<Vec<Learner>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name, created_at FROM learners ORDER BY created_at, id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut learners = Vec::new();
        for row in rows {
            let (id, name, created_at) = row?;
            learners.push(Learner {
                id: parse_learner_id(&id)?,
                name,
                created_at: parse_timestamp(&created_at)?,
            });
        }
        Ok(learners)
    }

    // ---- courses ----

    fn insert_course(&mut self, title: &str, description: Option<&str>) -> Result<CourseId> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO courses (title, description, state) VALUES (?1, ?2, 'active')",
            params![title, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn course(&mut self, id: CourseId) -> Result<Option<Course>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, description, state FROM courses WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, title, description, state)| {
            Ok(Course {
                id,
                title,
                description,
                state: parse_state(&state)?,
            })
        })
        .transpose()
    }

    fn course_detail(&mut self, id: CourseId) -> Result<Option<CourseDetail>> {
        let Some(course) = self.course(id)? else {
            return Ok(None);
        };

        let material_links = self.link_records(
            "SELECT material_id, state FROM course_material_links WHERE course_id = ?1",
            id,
        )?;
        let skill_links = self.link_records(
            "SELECT skill_id, state FROM course_skill_links WHERE course_id = ?1",
            id,
        )?;

        Ok(Some(CourseDetail {
            course,
            material_links,
            skill_links,
        }))
    }

    fn active_courses(&mut self) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, title, description, state FROM courses WHERE state = 'active' ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut courses = Vec::new();
        for row in rows {
            let (id, title, description, state) = row?;
            courses.push(Course {
                id,
                title,
                description,
                state: parse_state(&state)?,
            });
        }
        Ok(courses)
    }

    fn update_course(&mut self, course: &Course) -> Result<()> {
        self.begin()?;
        self.conn.execute(
            "UPDATE courses SET title = ?2, description = ?3, state = ?4 WHERE id = ?1",
            params![
                course.id,
                course.title,
                course.description,
                course.state.as_str()
            ],
        )?;
        Ok(())
    }

    fn missing_courses(&mut self, ids: &[CourseId]) -> Result<Vec<CourseId>> {
        self.missing_ids("courses", ids)
    }

    fn any_enrollment_by_course(&mut self, id: CourseId) -> Result<bool> {
        self.exists("SELECT 1 FROM enrollments WHERE course_id = ?1 LIMIT 1", id)
    }

    fn save_course_material_links(&mut self, id: CourseId, links: &[LinkRecord]) -> Result<()> {
        self.save_links(
            "INSERT INTO course_material_links (course_id, material_id, state) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(course_id, material_id) DO UPDATE SET state = excluded.state",
            id,
            links,
        )
    }

    fn save_course_skill_links(&mut self, id: CourseId, links: &[LinkRecord]) -> Result<()> {
        self.save_links(
            "INSERT INTO course_skill_links (course_id, skill_id, state) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(course_id, skill_id) DO UPDATE SET state = excluded.state",
            id,
            links,
        )
    }

    // ---- materials ----

    fn insert_material(&mut self, material: &Material) -> Result<MaterialId> {
        self.begin()?;
        let cols = VariantColumns::from_details(&material.details);
        self.conn.execute(
            "INSERT INTO materials (title, description, state, kind, duration_sec, width_px, \
             height_px, authors, pages, format_id, publication_year, source_url, published_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                material.title,
                material.description,
                material.state.as_str(),
                material.details.kind().as_str(),
                cols.duration_sec,
                cols.width_px,
                cols.height_px,
                cols.authors,
                cols.pages,
                cols.format_id,
                cols.publication_year,
                cols.source_url,
                cols.published_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn material(&mut self, id: MaterialId) -> Result<Option<Material>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, description, state, kind, duration_sec, width_px, height_px, \
                 authors, pages, format_id, publication_year, source_url, published_at \
                 FROM materials WHERE id = ?1",
                [id],
                MaterialRow::from_row,
            )
            .optional()?;

        row.map(MaterialRow::into_material).transpose()
    }

    fn active_materials(&mut self) -> Result<Vec<Material>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, title, description, state, kind, duration_sec, width_px, height_px, \
             authors, pages, format_id, publication_year, source_url, published_at \
             FROM materials WHERE state = 'active' ORDER BY id",
        )?;
        let rows = stmt.query_map([], MaterialRow::from_row)?;

        let mut materials = Vec::new();
        for row in rows {
            materials.push(row?.into_material()?);
        }
        Ok(materials)
    }

    fn update_material(&mut self, material: &Material) -> Result<()> {
        self.begin()?;
        let cols = VariantColumns::from_details(&material.details);
        self.conn.execute(
            "UPDATE materials SET title = ?2, description = ?3, state = ?4, kind = ?5, \
             duration_sec = ?6, width_px = ?7, height_px = ?8, authors = ?9, pages = ?10, \
             format_id = ?11, publication_year = ?12, source_url = ?13, published_at = ?14 \
             WHERE id = ?1",
            params![
                material.id,
                material.title,
                material.description,
                material.state.as_str(),
                material.details.kind().as_str(),
                cols.duration_sec,
                cols.width_px,
                cols.height_px,
                cols.authors,
                cols.pages,
                cols.format_id,
                cols.publication_year,
                cols.source_url,
                cols.published_at,
            ],
        )?;
        Ok(())
    }

    fn missing_materials(&mut self, ids: &[MaterialId]) -> Result<Vec<MaterialId>> {
        self.missing_ids("materials", ids)
    }

    fn any_completion_by_material(&mut self, id: MaterialId) -> Result<bool> {
        self.exists(
            "SELECT 1 FROM material_completions WHERE material_id = ?1 LIMIT 1",
            id,
        )
    }

    fn material_course_links(&mut self, id: MaterialId) -> Result<Vec<LinkRecord>> {
        self.link_records(
            "SELECT course_id, state FROM course_material_links WHERE material_id = ?1",
            id,
        )
    }

    fn save_material_course_links(&mut self, id: MaterialId, links: &[LinkRecord]) -> Result<()> {
        self.save_links(
            "INSERT INTO course_material_links (material_id, course_id, state) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(course_id, material_id) DO UPDATE SET state = excluded.state",
            id,
            links,
        )
    }

    fn book_format(&mut self, id: i64) -> Result<Option<BookFormat>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM book_formats WHERE id = ?1",
                [id],
                |row| {
                    Ok(BookFormat {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    fn book_formats(&mut self) -> Result<Vec<BookFormat>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, name FROM book_formats ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(BookFormat {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut formats = Vec::new();
        for row in rows {
            formats.push(row?);
        }
        Ok(formats)
    }

    // ---- skills ----

    fn insert_skill(&mut self, name: &str, description: Option<&str>) -> Result<SkillId> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO skills (name, description, state) VALUES (?1, ?2, 'active')",
            params![name, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn skill(&mut self, id: SkillId) -> Result<Option<Skill>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, description, state FROM skills WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, description, state)| {
            Ok(Skill {
                id,
                name,
                description,
                state: parse_state(&state)?,
            })
        })
        .transpose()
    }

    fn active_skills(&mut self) -> Result<Vec<Skill>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, name, description, state FROM skills WHERE state = 'active' ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut skills = Vec::new();
        for row in rows {
            let (id, name, description, state) = row?;
            skills.push(Skill {
                id,
                name,
                description,
                state: parse_state(&state)?,
            });
        }
        Ok(skills)
    }

    fn update_skill(&mut self, skill: &Skill) -> Result<()> {
        self.begin()?;
        self.conn.execute(
            "UPDATE skills SET name = ?2, description = ?3, state = ?4 WHERE id = ?1",
            params![skill.id, skill.name, skill.description, skill.state.as_str()],
        )?;
        Ok(())
    }

    fn missing_skills(&mut self, ids: &[SkillId]) -> Result<Vec<SkillId>> {
        self.missing_ids("skills", ids)
    }

    fn any_award_by_skill(&mut self, id: SkillId) -> Result<bool> {
        self.exists("SELECT 1 FROM skill_awards WHERE skill_id = ?1 LIMIT 1", id)
    }

    fn skill_course_links(&mut self, id: SkillId) -> Result<Vec<LinkRecord>> {
        self.link_records(
            "SELECT course_id, state FROM course_skill_links WHERE skill_id = ?1",
            id,
        )
    }

    fn save_skill_course_links(&mut self, id: SkillId, links: &[LinkRecord]) -> Result<()> {
        self.save_links(
            "INSERT INTO course_skill_links (skill_id, course_id, state) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(course_id, skill_id) DO UPDATE SET state = excluded.state",
            id,
            links,
        )
    }

    // ---- enrollments ----

    fn enrollment(&mut self, learner: LearnerId, course: CourseId) -> Result<Option<Enrollment>> {
        let row = self
            .conn
            .query_row(
                "SELECT status_id, progress_percent, enrolled_at FROM enrollments \
                 WHERE learner_id = ?1 AND course_id = ?2",
                params![learner.to_string(), course],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(status_id, percent, enrolled_at)| {
            Ok(Enrollment {
                learner_id: learner,
                course_id: course,
                status: self.status_from_id(status_id)?,
                progress_percent: parse_percent(percent)?,
                enrolled_at: parse_timestamp(&enrolled_at)?,
            })
        })
        .transpose()
    }

    fn insert_enrollment(&mut self, enrollment: &Enrollment) -> Result<()> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO enrollments (learner_id, course_id, status_id, progress_percent, enrolled_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                enrollment.learner_id.to_string(),
                enrollment.course_id,
                self.status_id(enrollment.status),
                enrollment.progress_percent,
                enrollment.enrolled_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update_enrollment(&mut self, enrollment: &Enrollment) -> Result<()> {
        self.begin()?;
        self.conn.execute(
            "UPDATE enrollments SET status_id = ?3, progress_percent = ?4 \
             WHERE learner_id = ?1 AND course_id = ?2",
            params![
                enrollment.learner_id.to_string(),
                enrollment.course_id,
                self.status_id(enrollment.status),
                enrollment.progress_percent,
            ],
        )?;
        Ok(())
    }

    fn enrollments_for_learner(&mut self, learner: LearnerId) -> Result<Vec<Enrollment>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT course_id, status_id, progress_percent, enrolled_at FROM enrollments \
             WHERE learner_id = ?1 ORDER BY course_id",
        )?;
        let rows = stmt.query_map([learner.to_string()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let raw: Vec<_> = rows.collect::<rusqlite::Result<_>>()?;
        let mut enrollments = Vec::new();
        for (course_id, status_id, percent, enrolled_at) in raw {
            enrollments.push(Enrollment {
                learner_id: learner,
                course_id,
                status: self.status_from_id(status_id)?,
                progress_percent: parse_percent(percent)?,
                enrolled_at: parse_timestamp(&enrolled_at)?,
            });
        }
        Ok(enrollments)
    }

    // ---- material completions ----

    fn completion_exists(&mut self, learner: LearnerId, material: MaterialId) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT 1 FROM material_completions WHERE learner_id = ?1 AND material_id = ?2",
        )?;
        Ok(stmt
            .query_row(params![learner.to_string(), material], |_| Ok(()))
            .optional()?
            .is_some())
    }

    fn insert_completion(&mut self, completion: &MaterialCompletion) -> Result<()> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO material_completions (learner_id, material_id, completed_at) \
             VALUES (?1, ?2, ?3)",
            params![
                completion.learner_id.to_string(),
                completion.material_id,
                completion.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn completed_material_ids(&mut self, learner: LearnerId) -> Result<HashSet<MaterialId>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT material_id FROM material_completions WHERE learner_id = ?1")?;
        let rows = stmt.query_map([learner.to_string()], |row| row.get::<_, i64>(0))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }

    // ---- skill awards ----

    fn award(&mut self, learner: LearnerId, skill: SkillId) -> Result<Option<SkillAward>> {
        let row = self
            .conn
            .query_row(
                "SELECT level, awarded_at FROM skill_awards \
                 WHERE learner_id = ?1 AND skill_id = ?2",
                params![learner.to_string(), skill],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(level, awarded_at)| {
            Ok(SkillAward {
                learner_id: learner,
                skill_id: skill,
                level: parse_level(level)?,
                awarded_at: parse_timestamp(&awarded_at)?,
            })
        })
        .transpose()
    }

    fn insert_award(&mut self, award: &SkillAward) -> Result<()> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO skill_awards (learner_id, skill_id, level, awarded_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                award.learner_id.to_string(),
                award.skill_id,
                award.level,
                award.awarded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update_award(&mut self, award: &SkillAward) -> Result<()> {
        self.begin()?;
        self.conn.execute(
            "UPDATE skill_awards SET level = ?3 WHERE learner_id = ?1 AND skill_id = ?2",
            params![award.learner_id.to_string(), award.skill_id, award.level],
        )?;
        Ok(())
    }

    fn awards_for_learner(&mut self, learner: LearnerId) -> Result<Vec<SkillAward>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT skill_id, level, awarded_at FROM skill_awards \
             WHERE learner_id = ?1 ORDER BY skill_id",
        )?;
        let rows = stmt.query_map([learner.to_string()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut awards = Vec::new();
        for row in rows {
            let (skill_id, level, awarded_at) = row?;
            awards.push(SkillAward {
                learner_id: learner,
                skill_id,
                level: parse_level(level)?,
                awarded_at: parse_timestamp(&awarded_at)?,
            });
        }
        Ok(awards)
    }

    fn save_changes(&mut self) -> Result<()> {
        if self.in_tx {
            self.conn.execute_batch("COMMIT")?;
            self.in_tx = false;
            self.commits += 1;
            debug!(commits = self.commits, "unit of work committed");
        }
        Ok(())
    }
}

fn resolve_statuses(conn: &Connection) -> Result<StatusIds> {
    let lookup = |name: &str| -> Result<i64> {
        conn.query_row(
            "SELECT id FROM enrollment_statuses WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| {
            PortalError::Integrity(format!(
                "enrollment status '{name}' missing from seed data"
            ))
        })
    };

    Ok(StatusIds {
        in_progress: lookup("InProgress")?,
        completed: lookup("Completed")?,
    })
}

/// Variant columns flattened for the single materials table; unrelated
/// columns stay NULL.
#[derive(Default)]
struct VariantColumns {
    duration_sec: Option<i64>,
    width_px: Option<i64>,
    height_px: Option<i64>,
    authors: Option<String>,
    pages: Option<i64>,
    format_id: Option<i64>,
    publication_year: Option<i64>,
    source_url: Option<String>,
    published_at: Option<String>,
}

impl VariantColumns {
    fn from_details(details: &MaterialDetails) -> Self {
        match details {
            MaterialDetails::Video {
                duration_sec,
                width_px,
                height_px,
            } => Self {
                duration_sec: Some(i64::from(*duration_sec)),
                width_px: Some(i64::from(*width_px)),
                height_px: Some(i64::from(*height_px)),
                ..Self::default()
            },
            MaterialDetails::Book {
                authors,
                pages,
                format_id,
                publication_year,
            } => Self {
                authors: Some(authors.clone()),
                pages: Some(i64::from(*pages)),
                format_id: Some(*format_id),
                publication_year: Some(i64::from(*publication_year)),
                ..Self::default()
            },
            MaterialDetails::Article {
                source_url,
                published_at,
            } => Self {
                source_url: Some(source_url.clone()),
                published_at: Some(published_at.to_string()),
                ..Self::default()
            },
        }
    }
}

struct MaterialRow {
    id: i64,
    title: String,
    description: Option<String>,
    state: String,
    kind: String,
    duration_sec: Option<i64>,
    width_px: Option<i64>,
    height_px: Option<i64>,
    authors: Option<String>,
    pages: Option<i64>,
    format_id: Option<i64>,
    publication_year: Option<i64>,
    source_url: Option<String>,
    published_at: Option<String>,
}

impl MaterialRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            state: row.get(3)?,
            kind: row.get(4)?,
            duration_sec: row.get(5)?,
            width_px: row.get(6)?,
            height_px: row.get(7)?,
            authors: row.get(8)?,
            pages: row.get(9)?,
            format_id: row.get(10)?,
            publication_year: row.get(11)?,
            source_url: row.get(12)?,
            published_at: row.get(13)?,
        })
    }

    fn into_material(self) -> Result<Material> {
        let id = self.id;
        let details = match self.kind.as_str() {
            "video" => MaterialDetails::Video {
                duration_sec: required_u32(self.duration_sec, "duration_sec", id)?,
                width_px: required_u32(self.width_px, "width_px", id)?,
                height_px: required_u32(self.height_px, "height_px", id)?,
            },
            "book" => MaterialDetails::Book {
                authors: required(self.authors, "authors", id)?,
                pages: required_u32(self.pages, "pages", id)?,
                format_id: required(self.format_id, "format_id", id)?,
                publication_year: required_i32(self.publication_year, "publication_year", id)?,
            },
            "article" => MaterialDetails::Article {
                source_url: required(self.source_url, "source_url", id)?,
                published_at: parse_date(&required(self.published_at, "published_at", id)?)?,
            },
            other => {
                return Err(PortalError::Integrity(format!(
                    "material {id} has unknown kind '{other}'"
                )));
            }
        };

        Ok(Material {
            id,
            title: self.title,
            description: self.description,
            state: parse_state(&self.state)?,
            details,
        })
    }
}

fn required<T>(value: Option<T>, column: &str, id: i64) -> Result<T> {
    value.ok_or_else(|| PortalError::Integrity(format!("material {id} is missing {column}")))
}

fn required_u32(value: Option<i64>, column: &str, id: i64) -> Result<u32> {
    let raw = required(value, column, id)?;
    u32::try_from(raw)
        .map_err(|_| PortalError::Integrity(format!("material {id} has invalid {column} {raw}")))
}

fn required_i32(value: Option<i64>, column: &str, id: i64) -> Result<i32> {
    let raw = required(value, column, id)?;
    i32::try_from(raw)
        .map_err(|_| PortalError::Integrity(format!("material {id} has invalid {column} {raw}")))
}

fn parse_state(value: &str) -> Result<RecordState> {
    RecordState::parse(value)
        .ok_or_else(|| PortalError::Integrity(format!("unknown record state '{value}'")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| PortalError::Integrity(format!("bad timestamp '{value}': {err}")))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    value
        .parse()
        .map_err(|err| PortalError::Integrity(format!("bad date '{value}': {err}")))
}

fn parse_learner_id(value: &str) -> Result<LearnerId> {
    value
        .parse()
        .map_err(|err| PortalError::Integrity(format!("bad learner id '{value}': {err}")))
}

fn parse_percent(value: i64) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| PortalError::Integrity(format!("progress percent {value} out of range")))
}

fn parse_level(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| PortalError::Integrity(format!("skill award level {value} out of range")))
}
