//! Material administration.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{
    BookFormat, CourseId, Material, MaterialDetails, MaterialId, MaterialKind, RecordState,
};
use crate::error::{PortalError, Result};
use crate::reconcile::reconcile_links;
use crate::store::Gateway;

pub struct MaterialCatalog<'a> {
    store: &'a mut dyn Gateway,
}

impl<'a> MaterialCatalog<'a> {
    pub fn new(store: &'a mut dyn Gateway) -> Self {
        Self { store }
    }

    pub fn add_video(
        &mut self,
        title: &str,
        description: Option<&str>,
        duration_sec: u32,
        width_px: u32,
        height_px: u32,
    ) -> Result<MaterialId> {
        self.add(
            title,
            description,
            MaterialDetails::Video {
                duration_sec,
                width_px,
                height_px,
            },
        )
    }

    pub fn add_book(
        &mut self,
        title: &str,
        description: Option<&str>,
        authors: &str,
        pages: u32,
        format_id: i64,
        publication_year: i32,
    ) -> Result<MaterialId> {
        self.store
            .book_format(format_id)?
            .ok_or(PortalError::BookFormatNotFound(format_id))?;

        self.add(
            title,
            description,
            MaterialDetails::Book {
                authors: authors.to_string(),
                pages,
                format_id,
                publication_year,
            },
        )
    }

    pub fn add_article(
        &mut self,
        title: &str,
        description: Option<&str>,
        source_url: &str,
        published_at: NaiveDate,
    ) -> Result<MaterialId> {
        self.add(
            title,
            description,
            MaterialDetails::Article {
                source_url: source_url.to_string(),
                published_at,
            },
        )
    }

    fn add(
        &mut self,
        title: &str,
        description: Option<&str>,
        details: MaterialDetails,
    ) -> Result<MaterialId> {
        let kind = details.kind();
        let id = self.store.insert_material(&Material {
            id: 0,
            title: title.to_string(),
            description: description.map(ToString::to_string),
            state: RecordState::Active,
            details,
        })?;
        self.store.save_changes()?;
        info!(material_id = id, %kind, title, "material created");
        Ok(id)
    }

    pub fn list(&mut self) -> Result<Vec<Material>> {
        self.store.active_materials()
    }

    pub fn detail(&mut self, id: MaterialId) -> Result<Material> {
        self.store
            .material(id)?
            .ok_or(PortalError::MaterialNotFound(id))
    }

    /// Update a video's common and variant fields. The material must
    /// actually be a video.
    pub fn update_video(
        &mut self,
        id: MaterialId,
        title: Option<&str>,
        description: Option<&str>,
        duration_sec: Option<u32>,
    ) -> Result<()> {
        let mut material = self.require_kind(id, MaterialKind::Video)?;
        apply_common(&mut material, title, description);
        if let (
            Some(new_duration),
            MaterialDetails::Video { duration_sec, .. },
        ) = (duration_sec, &mut material.details)
        {
            *duration_sec = new_duration;
        }
        self.save(&material)
    }

    pub fn update_book(
        &mut self,
        id: MaterialId,
        title: Option<&str>,
        description: Option<&str>,
        authors: Option<&str>,
        pages: Option<u32>,
    ) -> Result<()> {
        let mut material = self.require_kind(id, MaterialKind::Book)?;
        apply_common(&mut material, title, description);
        if let MaterialDetails::Book {
            authors: current_authors,
            pages: current_pages,
            ..
        } = &mut material.details
        {
            if let Some(authors) = authors {
                *current_authors = authors.to_string();
            }
            if let Some(pages) = pages {
                *current_pages = pages;
            }
        }
        self.save(&material)
    }

    pub fn update_article(
        &mut self,
        id: MaterialId,
        title: Option<&str>,
        description: Option<&str>,
        source_url: Option<&str>,
    ) -> Result<()> {
        let mut material = self.require_kind(id, MaterialKind::Article)?;
        apply_common(&mut material, title, description);
        if let (
            Some(new_url),
            MaterialDetails::Article { source_url, .. },
        ) = (source_url, &mut material.details)
        {
            *source_url = new_url.to_string();
        }
        self.save(&material)
    }

    /// Retire a material. Refused while any learner has completed it.
    pub fn remove(&mut self, id: MaterialId) -> Result<()> {
        let mut material = self.detail(id)?;

        if self.store.any_completion_by_material(id)? {
            return Err(PortalError::InvalidOperation(format!(
                "material {id} cannot be deleted because learners have already completed it"
            )));
        }

        material.state = RecordState::Retired;
        self.store.update_material(&material)?;
        self.store.save_changes()?;
        info!(material_id = id, "material retired");
        Ok(())
    }

    /// Ids of courses actively using this material, ascending.
    pub fn assigned_course_ids(&mut self, id: MaterialId) -> Result<Vec<CourseId>> {
        self.detail(id)?;
        let links = self.store.material_course_links(id)?;
        let mut ids: Vec<CourseId> = links
            .iter()
            .filter(|link| link.state.is_active())
            .map(|link| link.counterpart_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    /// Converge the material's course links to exactly `course_ids`.
    pub fn set_courses(&mut self, id: MaterialId, course_ids: &[CourseId]) -> Result<()> {
        self.detail(id)?;

        let missing = self.store.missing_courses(course_ids)?;
        if let Some(&first) = missing.first() {
            return Err(PortalError::CourseNotFound(first));
        }

        let mut links = self.store.material_course_links(id)?;
        let outcome = reconcile_links(&mut links, course_ids);
        self.store.save_material_course_links(id, &links)?;
        self.store.save_changes()?;
        info!(
            material_id = id,
            activated = outcome.activated,
            retired = outcome.retired,
            created = outcome.created,
            "material courses updated"
        );
        Ok(())
    }

    pub fn book_formats(&mut self) -> Result<Vec<BookFormat>> {
        self.store.book_formats()
    }

    fn require_kind(&mut self, id: MaterialId, kind: MaterialKind) -> Result<Material> {
        let material = self.detail(id)?;
        if material.details.kind() != kind {
            return Err(PortalError::InvalidOperation(format!(
                "material {id} is not a {kind}"
            )));
        }
        Ok(material)
    }

    fn save(&mut self, material: &Material) -> Result<()> {
        self.store.update_material(material)?;
        self.store.save_changes()?;
        Ok(())
    }
}

fn apply_common(material: &mut Material, title: Option<&str>, description: Option<&str>) {
    if let Some(title) = title {
        material.title = title.to_string();
    }
    if let Some(description) = description {
        material.description = Some(description.to_string());
    }
}
