//! CLI module - command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

pub mod commands;

/// Education portal - courses, materials, skills, enrollment tracking
#[derive(Parser, Debug)]
#[command(name = "edp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable machine-readable JSON output
    #[arg(long, short = 'm', global = true)]
    pub machine: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/edp/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize (or migrate) the portal database
    Init,
    /// Manage learners
    Learner {
        #[command(subcommand)]
        command: LearnerCommands,
    },
    /// Manage courses and their material/skill links
    Course {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Manage learning materials
    Material {
        #[command(subcommand)]
        command: MaterialCommands,
    },
    /// Manage skills
    Skill {
        #[command(subcommand)]
        command: SkillCommands,
    },
    /// Enroll a learner in a course
    Enroll(LearnerCourseArgs),
    /// Record a completed material for a learner
    CompleteMaterial(CompleteMaterialArgs),
    /// Mark a whole course completed for a learner
    CompleteCourse(LearnerCourseArgs),
    /// Show a learner's enrollment status for a course
    Status(LearnerCourseArgs),
    /// Show a learner's profile
    Profile(ProfileArgs),
}

#[derive(Subcommand, Debug)]
pub enum LearnerCommands {
    /// Register a new learner
    Add(LearnerAddArgs),
    /// List registered learners
    List,
}

#[derive(Args, Debug)]
pub struct LearnerAddArgs {
    /// Display name
    pub name: String,
}

#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    /// Create a course
    Add(NamedEntityArgs),
    /// List active courses
    List,
    /// Show a course with its links
    Show(IdArg),
    /// Update title/description
    Update(UpdateEntityArgs),
    /// Retire a course (refused while learners are enrolled)
    Rm(IdArg),
    /// Set the exact material ids linked to a course
    SetMaterials(SetLinksArgs),
    /// Set the exact skill ids granted by a course
    SetSkills(SetLinksArgs),
}

#[derive(Subcommand, Debug)]
pub enum MaterialCommands {
    /// Add a video material
    AddVideo(AddVideoArgs),
    /// Add a book material
    AddBook(AddBookArgs),
    /// Add an article material
    AddArticle(AddArticleArgs),
    /// List active materials
    List,
    /// Show one material
    Show(IdArg),
    /// Retire a material (refused once completed by learners)
    Rm(IdArg),
    /// Set the exact course ids a material belongs to
    SetCourses(SetLinksArgs),
    /// List seeded book formats
    Formats,
}

#[derive(Subcommand, Debug)]
pub enum SkillCommands {
    /// Create a skill
    Add(NamedEntityArgs),
    /// List active skills
    List,
    /// Retire a skill (refused once awarded)
    Rm(IdArg),
    /// Set the exact course ids granting a skill
    SetCourses(SetLinksArgs),
}

#[derive(Args, Debug)]
pub struct NamedEntityArgs {
    /// Title or name
    pub title: String,

    /// Optional description
    #[arg(long, short)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateEntityArgs {
    pub id: i64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(long, short)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct IdArg {
    pub id: i64,
}

#[derive(Args, Debug)]
pub struct SetLinksArgs {
    /// Owner entity id
    pub id: i64,

    /// Desired counterpart ids; duplicates are tolerated
    pub ids: Vec<i64>,
}

#[derive(Args, Debug)]
pub struct AddVideoArgs {
    pub title: String,

    #[arg(long, short)]
    pub description: Option<String>,

    /// Duration in seconds
    #[arg(long)]
    pub duration_sec: u32,

    #[arg(long, default_value = "1920")]
    pub width_px: u32,

    #[arg(long, default_value = "1080")]
    pub height_px: u32,
}

#[derive(Args, Debug)]
pub struct AddBookArgs {
    pub title: String,

    #[arg(long, short)]
    pub description: Option<String>,

    /// Comma-separated author names
    #[arg(long)]
    pub authors: String,

    #[arg(long)]
    pub pages: u32,

    /// Seeded book format id (see `edp material formats`)
    #[arg(long)]
    pub format: i64,

    #[arg(long)]
    pub year: i32,
}

#[derive(Args, Debug)]
pub struct AddArticleArgs {
    pub title: String,

    #[arg(long, short)]
    pub description: Option<String>,

    #[arg(long)]
    pub url: String,

    /// Publication date (YYYY-MM-DD)
    #[arg(long)]
    pub published: chrono::NaiveDate,
}

#[derive(Args, Debug)]
pub struct LearnerCourseArgs {
    /// Learner id
    pub learner: Uuid,

    /// Course id
    pub course: i64,
}

#[derive(Args, Debug)]
pub struct CompleteMaterialArgs {
    /// Learner id
    pub learner: Uuid,

    /// Material id
    pub material: i64,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Learner id
    pub learner: Uuid,
}
