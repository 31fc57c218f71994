//! edp skill - skill administration commands

use colored::Colorize;

use crate::app::AppContext;
use crate::catalog::SkillCatalog;
use crate::cli::SkillCommands;
use crate::error::Result;

use super::{ack, emit_json};

pub fn run(ctx: &mut AppContext, command: &SkillCommands) -> Result<()> {
    let machine = ctx.machine;
    let mut catalog = SkillCatalog::new(&mut ctx.db);

    match command {
        SkillCommands::Add(args) => {
            let id = catalog.create(&args.title, args.description.as_deref())?;
            drop(catalog);
            if machine {
                emit_json(&serde_json::json!({ "ok": true, "skill_id": id }))
            } else {
                ack(ctx, &format!("skill {id} created"))
            }
        }
        SkillCommands::List => {
            let skills = catalog.list()?;
            if machine {
                return emit_json(&skills);
            }
            if skills.is_empty() {
                println!("no active skills");
                return Ok(());
            }
            for skill in skills {
                println!("{:>5}  {}", skill.id.to_string().cyan(), skill.name);
            }
            Ok(())
        }
        SkillCommands::Rm(args) => {
            catalog.remove(args.id)?;
            drop(catalog);
            ack(ctx, &format!("skill {} retired", args.id))
        }
        SkillCommands::SetCourses(args) => {
            catalog.set_courses(args.id, &args.ids)?;
            drop(catalog);
            ack(ctx, &format!("skill {} courses updated", args.id))
        }
    }
}
