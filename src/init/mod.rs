//! Initialization of burndown workspaces.
//!
//! `burndown init` creates the `.burndown/` directory structure:
//!
//! ```text
//! .burndown/
//! ├── burndown.toml    # Workspace configuration (defaults written on init)
//! └── projects/        # Exported project files (*.json)
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::burndown_config::{BurndownToml, CONFIG_FILE};
use crate::capacity::TeamMember;
use crate::effort::RoleEffort;
use crate::project::ProjectFile;

/// The name of the workspace directory.
pub const BURNDOWN_DIR: &str = ".burndown";

/// Subdirectory holding project files.
pub const PROJECTS_DIR: &str = "projects";

/// Result of initializing a workspace.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the .burndown directory
    pub burndown_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
    /// Path of the sample project, if one was written
    pub sample: Option<PathBuf>,
}

/// Initialize a burndown workspace in the given directory.
///
/// Existing files are left untouched. With `with_sample` a small example
/// project is written to `projects/sample.json` unless it already exists.
pub fn init_workspace(project_dir: &Path, with_sample: bool) -> Result<InitResult> {
    let burndown_dir = get_burndown_dir(project_dir);
    let created = !burndown_dir.exists();

    std::fs::create_dir_all(&burndown_dir)
        .with_context(|| format!("Failed to create directory: {}", burndown_dir.display()))?;
    ensure_directory_structure(&burndown_dir)?;

    let sample = if with_sample {
        let path = burndown_dir.join(PROJECTS_DIR).join("sample.json");
        if !path.exists() {
            sample_project().save(&path)?;
        }
        Some(path)
    } else {
        None
    };

    Ok(InitResult {
        burndown_dir,
        created,
        sample,
    })
}

fn ensure_directory_structure(burndown_dir: &Path) -> Result<()> {
    let projects_dir = burndown_dir.join(PROJECTS_DIR);
    std::fs::create_dir_all(&projects_dir).with_context(|| {
        format!(
            "Failed to create projects directory: {}",
            projects_dir.display()
        )
    })?;

    let config_file = burndown_dir.join(CONFIG_FILE);
    if !config_file.exists() {
        BurndownToml::default().save(&config_file)?;
    }

    Ok(())
}

/// FE and BE in parallel, QA afterwards, with a small team.
fn sample_project() -> ProjectFile {
    let mut project = ProjectFile::new("Sample project");
    project.start_date = NaiveDate::from_ymd_opt(2026, 1, 5);
    project.target_delivery_date = NaiveDate::from_ymd_opt(2026, 1, 30);
    project.efforts = vec![
        RoleEffort::new("fe", 10.0, 0.0),
        RoleEffort::new("be", 6.0, 0.0),
        RoleEffort::new("qa", 4.0, 0.0),
    ];
    project.team = vec![
        TeamMember::new("Frontend dev", "fe", 1.0),
        TeamMember::new("Backend dev", "be", 1.0),
        TeamMember::new("Tester", "qa", 1.0),
    ];
    project
}

/// Check if a workspace is initialized.
pub fn is_initialized(project_dir: &Path) -> bool {
    project_dir.join(BURNDOWN_DIR).exists()
}

/// Get the path to the workspace directory.
pub fn get_burndown_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(BURNDOWN_DIR)
}
