//! edp material - material administration commands

use colored::Colorize;

use crate::app::AppContext;
use crate::catalog::MaterialCatalog;
use crate::cli::MaterialCommands;
use crate::error::Result;

use super::{ack, emit_json};

pub fn run(ctx: &mut AppContext, command: &MaterialCommands) -> Result<()> {
    let machine = ctx.machine;
    let mut catalog = MaterialCatalog::new(&mut ctx.db);

    match command {
        MaterialCommands::AddVideo(args) => {
            let id = catalog.add_video(
                &args.title,
                args.description.as_deref(),
                args.duration_sec,
                args.width_px,
                args.height_px,
            )?;
            drop(catalog);
            if machine {
                emit_json(&serde_json::json!({ "ok": true, "material_id": id }))
            } else {
                ack(ctx, &format!("video material {id} created"))
            }
        }
        MaterialCommands::AddBook(args) => {
            let id = catalog.add_book(
                &args.title,
                args.description.as_deref(),
                &args.authors,
                args.pages,
                args.format,
                args.year,
            )?;
            drop(catalog);
            if machine {
                emit_json(&serde_json::json!({ "ok": true, "material_id": id }))
            } else {
                ack(ctx, &format!("book material {id} created"))
            }
        }
        MaterialCommands::AddArticle(args) => {
            let id = catalog.add_article(
                &args.title,
                args.description.as_deref(),
                &args.url,
                args.published,
            )?;
            drop(catalog);
            if machine {
                emit_json(&serde_json::json!({ "ok": true, "material_id": id }))
            } else {
                ack(ctx, &format!("article material {id} created"))
            }
        }
        MaterialCommands::List => {
            let materials = catalog.list()?;
            if machine {
                return emit_json(&materials);
            }
            if materials.is_empty() {
                println!("no active materials");
                return Ok(());
            }
            for material in materials {
                println!(
                    "{:>5}  {:<8}{}",
                    material.id.to_string().cyan(),
                    material.details.kind(),
                    material.title
                );
            }
            Ok(())
        }
        MaterialCommands::Show(args) => {
            let material = catalog.detail(args.id)?;
            if machine {
                return emit_json(&material);
            }
            println!(
                "{} {} ({})",
                material.id.to_string().cyan(),
                material.title.bold(),
                material.details.kind()
            );
            if let Some(description) = &material.description {
                println!("  {description}");
            }
            Ok(())
        }
        MaterialCommands::Rm(args) => {
            catalog.remove(args.id)?;
            drop(catalog);
            ack(ctx, &format!("material {} retired", args.id))
        }
        MaterialCommands::SetCourses(args) => {
            catalog.set_courses(args.id, &args.ids)?;
            drop(catalog);
            ack(ctx, &format!("material {} courses updated", args.id))
        }
        MaterialCommands::Formats => {
            let formats = catalog.book_formats()?;
            if machine {
                return emit_json(&formats);
            }
            for format in formats {
                println!("{:>3}  {}", format.id.to_string().cyan(), format.name);
            }
            Ok(())
        }
    }
}
