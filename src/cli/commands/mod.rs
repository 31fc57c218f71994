//! CLI command implementations
//!
//! Each command group has its own module; `run` dispatches to the handler.

use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod course;
pub mod enrollment;
pub mod learner;
pub mod material;
pub mod skill;

/// Dispatch a command to its handler
pub fn run(ctx: &mut AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Init => init(ctx),
        Commands::Learner { command } => learner::run(ctx, command),
        Commands::Course { command } => course::run(ctx, command),
        Commands::Material { command } => material::run(ctx, command),
        Commands::Skill { command } => skill::run(ctx, command),
        Commands::Enroll(args) => enrollment::enroll(ctx, args),
        Commands::CompleteMaterial(args) => enrollment::complete_material(ctx, args),
        Commands::CompleteCourse(args) => enrollment::complete_course(ctx, args),
        Commands::Status(args) => enrollment::status(ctx, args),
        Commands::Profile(args) => enrollment::profile(ctx, args),
    }
}

fn init(ctx: &mut AppContext) -> Result<()> {
    // opening the context already created and migrated the database
    let path = ctx.config.db_path()?;
    if ctx.machine {
        emit_json(&serde_json::json!({
            "ok": true,
            "db_path": path,
            "schema_version": ctx.db.schema_version(),
        }))?;
    } else {
        println!(
            "{} database ready at {}",
            "ok:".green().bold(),
            path.display()
        );
    }
    Ok(())
}

pub(crate) fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub(crate) fn ack(ctx: &AppContext, message: &str) -> Result<()> {
    if ctx.machine {
        emit_json(&serde_json::json!({ "ok": true, "message": message }))?;
    } else {
        println!("{} {message}", "ok:".green().bold());
    }
    Ok(())
}
