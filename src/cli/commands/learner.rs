//! edp learner - learner registry commands

use chrono::Utc;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::LearnerCommands;
use crate::domain::{Learner, LearnerId};
use crate::error::Result;
use crate::store::Gateway;

use super::emit_json;

pub fn run(ctx: &mut AppContext, command: &LearnerCommands) -> Result<()> {
    match command {
        LearnerCommands::Add(args) => add(ctx, &args.name),
        LearnerCommands::List => list(ctx),
    }
}

fn add(ctx: &mut AppContext, name: &str) -> Result<()> {
    let learner = Learner {
        id: LearnerId::new(),
        name: name.to_string(),
        created_at: Utc::now(),
    };
    ctx.db.insert_learner(&learner)?;
    ctx.db.save_changes()?;

    if ctx.machine {
        emit_json(&learner)?;
    } else {
        println!("{} learner {} ({})", "ok:".green().bold(), learner.name, learner.id);
    }
    Ok(())
}

fn list(ctx: &mut AppContext) -> Result<()> {
    let learners = ctx.db.learners()?;
    if ctx.machine {
        return emit_json(&learners);
    }

    if learners.is_empty() {
        println!("no learners registered");
        return Ok(());
    }
    for learner in learners {
        println!("{}  {}", learner.id.to_string().cyan(), learner.name);
    }
    Ok(())
}
