//! edp course - course administration commands

use colored::Colorize;

use crate::app::AppContext;
use crate::catalog::CourseCatalog;
use crate::cli::CourseCommands;
use crate::error::Result;

use super::{ack, emit_json};

pub fn run(ctx: &mut AppContext, command: &CourseCommands) -> Result<()> {
    let machine = ctx.machine;
    let mut catalog = CourseCatalog::new(&mut ctx.db);

    match command {
        CourseCommands::Add(args) => {
            let id = catalog.create(&args.title, args.description.as_deref())?;
            drop(catalog);
            if machine {
                emit_json(&serde_json::json!({ "ok": true, "course_id": id }))
            } else {
                ack(ctx, &format!("course {id} created"))
            }
        }
        CourseCommands::List => {
            let courses = catalog.list()?;
            if machine {
                return emit_json(&courses);
            }
            if courses.is_empty() {
                println!("no active courses");
                return Ok(());
            }
            for course in courses {
                println!("{:>5}  {}", course.id.to_string().cyan(), course.title);
            }
            Ok(())
        }
        CourseCommands::Show(args) => {
            let detail = catalog.detail(args.id)?;
            if machine {
                return emit_json(&detail);
            }
            println!("{} {}", detail.course.id.to_string().cyan(), detail.course.title.bold());
            if let Some(description) = &detail.course.description {
                println!("  {description}");
            }
            println!("  materials: {:?}", detail.active_material_ids());
            println!("  skills:    {:?}", detail.active_skill_ids());
            Ok(())
        }
        CourseCommands::Update(args) => {
            catalog.update(args.id, args.title.as_deref(), args.description.as_deref())?;
            drop(catalog);
            ack(ctx, &format!("course {} updated", args.id))
        }
        CourseCommands::Rm(args) => {
            catalog.remove(args.id)?;
            drop(catalog);
            ack(ctx, &format!("course {} retired", args.id))
        }
        CourseCommands::SetMaterials(args) => {
            catalog.set_materials(args.id, &args.ids)?;
            drop(catalog);
            ack(ctx, &format!("course {} materials updated", args.id))
        }
        CourseCommands::SetSkills(args) => {
            catalog.set_skills(args.id, &args.ids)?;
            drop(catalog);
            ack(ctx, &format!("course {} skills updated", args.id))
        }
    }
}
