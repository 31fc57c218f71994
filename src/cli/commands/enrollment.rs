//! edp enroll / complete-material / complete-course / status / profile

use colored::Colorize;

use crate::app::AppContext;
use crate::cli::{CompleteMaterialArgs, LearnerCourseArgs, ProfileArgs};
use crate::domain::{EnrollmentState, LearnerId};
use crate::enrollment::EnrollmentService;
use crate::error::Result;
use crate::profile::ProfileService;

use super::{ack, emit_json};

pub fn enroll(ctx: &mut AppContext, args: &LearnerCourseArgs) -> Result<()> {
    EnrollmentService::new(&mut ctx.db).enroll(LearnerId(args.learner), args.course)?;
    ack(
        ctx,
        &format!("learner {} enrolled in course {}", args.learner, args.course),
    )
}

pub fn complete_material(ctx: &mut AppContext, args: &CompleteMaterialArgs) -> Result<()> {
    EnrollmentService::new(&mut ctx.db)
        .mark_material_complete(LearnerId(args.learner), args.material)?;
    ack(
        ctx,
        &format!("material {} completed for learner {}", args.material, args.learner),
    )
}

pub fn complete_course(ctx: &mut AppContext, args: &LearnerCourseArgs) -> Result<()> {
    EnrollmentService::new(&mut ctx.db).complete_course(LearnerId(args.learner), args.course)?;
    ack(
        ctx,
        &format!("course {} completed for learner {}", args.course, args.learner),
    )
}

pub fn status(ctx: &mut AppContext, args: &LearnerCourseArgs) -> Result<()> {
    let state = EnrollmentService::new(&mut ctx.db).status(LearnerId(args.learner), args.course)?;

    if ctx.machine {
        return emit_json(&serde_json::json!({
            "learner_id": args.learner,
            "course_id": args.course,
            "status": state,
        }));
    }

    let rendered = match state {
        EnrollmentState::NotEnrolled => state.to_string().dimmed(),
        EnrollmentState::InProgress => state.to_string().yellow(),
        EnrollmentState::Completed => state.to_string().green(),
    };
    println!("course {}: {rendered}", args.course);
    Ok(())
}

pub fn profile(ctx: &mut AppContext, args: &ProfileArgs) -> Result<()> {
    let profile = ProfileService::new(&mut ctx.db).profile(LearnerId(args.learner))?;

    if ctx.machine {
        return emit_json(&profile);
    }

    println!("{}", profile.learner.name.bold());
    println!("registered {}", profile.learner.created_at.format("%Y-%m-%d"));

    if !profile.in_progress.is_empty() {
        println!("\n{}", "in progress".yellow().bold());
        for item in &profile.in_progress {
            println!("  {:>5}  {:<40} {:>3}%", item.course_id, item.title, item.progress_percent);
        }
    }
    if !profile.completed.is_empty() {
        println!("\n{}", "completed".green().bold());
        for item in &profile.completed {
            println!("  {:>5}  {}", item.course_id, item.title);
        }
    }
    if !profile.skills.is_empty() {
        println!("\n{}", "skills".cyan().bold());
        for item in &profile.skills {
            println!("  {:<30} level {}", item.name, item.level);
        }
    }
    Ok(())
}
