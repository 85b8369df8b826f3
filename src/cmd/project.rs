//! Workspace initialization and project listing.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use burndown::config::Config;

pub fn cmd_init(project_dir: &Path, with_sample: bool) -> Result<()> {
    use burndown::init::{init_workspace, is_initialized};

    let was_initialized = is_initialized(project_dir);

    let result = init_workspace(project_dir, with_sample)?;

    if result.created {
        println!(
            "Initialized burndown workspace at {}",
            result.burndown_dir.display()
        );
        println!();
        println!("Created directory structure:");
        println!("  .burndown/");
        println!("  ├── burndown.toml # Workspace configuration");
        println!("  └── projects/     # Project exports (*.json)");
        println!();
        println!("Next steps:");
        println!("  1. Copy project exports into .burndown/projects/");
        println!("  2. Run `burndown forecast` to project delivery dates");
    } else if was_initialized {
        println!(
            "Burndown workspace already initialized at {}",
            result.burndown_dir.display()
        );
        println!("Directory structure verified.");
    }

    if let Some(sample) = &result.sample {
        println!("Sample project: {}", sample.display());
    }

    Ok(())
}

#[derive(Serialize)]
struct ProjectSummary {
    file: String,
    name: String,
    roles: usize,
    remaining_mandays: f64,
    target_delivery_date: Option<chrono::NaiveDate>,
}

pub fn cmd_list(config: &Config, json: bool) -> Result<()> {
    use burndown::effort::total_remaining;
    use burndown::project::ProjectFile;

    let files = config.project_files()?;

    let mut summaries = Vec::new();
    for file in &files {
        match ProjectFile::load(file) {
            Ok(project) => summaries.push(ProjectSummary {
                file: file_stem(file),
                name: project.name.clone(),
                roles: project.effort_roles().len(),
                remaining_mandays: total_remaining(&project.efforts),
                target_delivery_date: project.target_delivery_date,
            }),
            Err(e) => eprintln!(
                "{} {:#}",
                console::style("Skipping:").yellow().bold(),
                e
            ),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!();
        println!(
            "No projects found in {}. Run 'burndown init --sample' or copy exports there.",
            config.projects_dir.display()
        );
        println!();
        return Ok(());
    }

    println!();
    println!(
        "{:<20} {:<28} {:<6} {:<10} Target",
        "File", "Name", "Roles", "Remaining"
    );
    println!(
        "{:<20} {:<28} {:<6} {:<10} ----------",
        "--------------------", "----------------------------", "-----", "---------"
    );
    for summary in &summaries {
        println!(
            "{:<20} {:<28} {:<6} {:<10.1} {}",
            summary.file,
            summary.name,
            summary.roles,
            summary.remaining_mandays,
            summary
                .target_delivery_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    println!();
    println!("{} project(s)", summaries.len());
    println!();

    Ok(())
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
