//! The `assessly list` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use assessly_core::catalog::AssessmentCatalog;

use super::open_backend;

pub async fn execute(
    category: Option<String>,
    search: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let backend = open_backend(config_path.as_deref())?;

    let mut catalog = AssessmentCatalog::new();
    catalog
        .refresh(backend.as_ref())
        .await
        .context("failed to load assessments")?;

    let shown = catalog.filter(category.as_deref(), search.as_deref());
    if shown.is_empty() {
        if catalog.is_empty() {
            println!("No assessments available.");
        } else {
            println!("No assessments match the given filters.");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Category", "Questions", "Duration"]);
    for a in &shown {
        table.add_row(vec![
            Cell::new(a.route_id()),
            Cell::new(&a.title),
            Cell::new(&a.category),
            Cell::new(a.questions.len()),
            Cell::new(format!("{} min", a.duration)),
        ]);
    }
    println!("{table}");

    let categories = catalog.categories();
    if !categories.is_empty() {
        println!("Categories: {}", categories.join(", "));
    }

    Ok(())
}
