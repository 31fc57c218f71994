//! Error handling for the education portal.
//!
//! One error enum for every portal operation, split along the lines callers
//! care about: not-found (user-correctable, names the offending id),
//! invalid operation (user-correctable, a disallowed mutation), and
//! integrity faults (misconfiguration or broken seed data, not retryable).

use std::io;

use thiserror::Error;
use uuid::Uuid;

/// Main error type for portal operations.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Learner '{0}' not found")]
    LearnerNotFound(Uuid),

    #[error("Course {0} not found")]
    CourseNotFound(i64),

    #[error("Material {0} not found")]
    MaterialNotFound(i64),

    #[error("Skill {0} not found")]
    SkillNotFound(i64),

    #[error("Book format {0} not found")]
    BookFormatNotFound(i64),

    #[error("Enrollment for learner '{learner_id}' and course {course_id} not found")]
    EnrollmentNotFound { learner_id: Uuid, course_id: i64 },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Integrity fault: {0}")]
    Integrity(String),
}

impl PortalError {
    /// Whether the error names a missing entity the caller referenced by id.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::LearnerNotFound(_)
                | Self::CourseNotFound(_)
                | Self::MaterialNotFound(_)
                | Self::SkillNotFound(_)
                | Self::BookFormatNotFound(_)
                | Self::EnrollmentNotFound { .. }
        )
    }

    /// Whether the error is user-correctable, as opposed to a deployment or
    /// data-integrity problem.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        self.is_not_found() || matches!(self, Self::InvalidOperation(_))
    }
}

/// Result type alias using `PortalError`.
pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(PortalError::CourseNotFound(7).is_not_found());
        assert!(PortalError::LearnerNotFound(Uuid::nil()).is_not_found());
        assert!(
            PortalError::EnrollmentNotFound {
                learner_id: Uuid::nil(),
                course_id: 3,
            }
            .is_not_found()
        );
        assert!(!PortalError::Integrity("seed".into()).is_not_found());
        assert!(!PortalError::InvalidOperation("nope".into()).is_not_found());
    }

    #[test]
    fn test_user_error_classification() {
        assert!(PortalError::MaterialNotFound(1).is_user_error());
        assert!(PortalError::InvalidOperation("in use".into()).is_user_error());
        assert!(!PortalError::Integrity("missing status".into()).is_user_error());
    }

    #[test]
    fn test_display_includes_offending_id() {
        let err = PortalError::SkillNotFound(42);
        assert!(err.to_string().contains("42"));

        let err = PortalError::EnrollmentNotFound {
            learner_id: Uuid::nil(),
            course_id: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
        assert!(msg.contains('9'));
    }
}
