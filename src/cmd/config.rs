//! Configuration view and validation commands (`burndown config`).

use anyhow::Result;

use burndown::burndown_config::BurndownToml;
use burndown::config::Config;

use super::super::ConfigCommands;

pub fn cmd_config(config: &Config, command: Option<ConfigCommands>) -> Result<()> {
    let burndown_config = config.burndown_config();
    let config_path = burndown_config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Burndown Configuration");
            println!("======================");
            println!();

            let toml = &burndown_config.toml;
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No burndown.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            if let Some(name) = &toml.workspace.name {
                println!("[workspace]");
                println!("  name = \"{}\"", name);
                println!();
            }

            println!("[defaults]");
            println!("  default_fte = {}", toml.defaults.default_fte);
            println!("  capacity_mode = \"{}\"", toml.defaults.capacity_mode);
            println!("  allocation_window = {}", toml.defaults.allocation_window);
            if let Some(fte) = toml.defaults.default_allocation_fte {
                println!("  default_allocation_fte = {}", fte);
            }
            println!("  start = \"{}\"", toml.defaults.start);
            println!();

            if !toml.calendar.holidays.is_empty() {
                println!("[calendar]");
                println!("  holidays = [{}]", toml.calendar.holidays.join(", "));
                println!();
            }

            println!("Roles:");
            for role in toml.role_definitions() {
                if role.depends_on.is_empty() {
                    println!("  {} ({})", role.id, role.display_name());
                } else {
                    println!(
                        "  {} ({}) after {}",
                        role.id,
                        role.display_name(),
                        role.depends_on.join(", ")
                    );
                }
            }
            println!();

            if !toml.roles.overrides.is_empty() {
                println!("[roles.overrides]");
                let mut patterns: Vec<_> = toml.roles.overrides.iter().collect();
                patterns.sort_by(|a, b| a.0.cmp(b.0));
                for (pattern, override_cfg) in patterns {
                    println!("  \"{}\":", pattern);
                    if let Some(fte) = override_cfg.default_fte {
                        println!("    default_fte = {}", fte);
                    }
                }
                println!();
            }

            match toml.dependency_plan() {
                Ok(plan) => {
                    println!("Stages:");
                    for (i, stage) in plan.stages.iter().enumerate() {
                        println!("  {}. {} [{}]", i + 1, stage.kind, stage.roles.join(", "));
                    }
                }
                Err(e) => println!("Stages: {}", console::style(e).red()),
            }
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  default_fte = {}", burndown_config.default_fte());
            println!("  capacity_mode = \"{}\"", burndown_config.capacity_mode());
            println!("  start = \"{}\"", burndown_config.start_policy());
            println!("  today = {}", config.today);
            println!();

            if !config_path.exists() {
                println!("Run 'burndown config init' to create a burndown.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No burndown.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = BurndownToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("burndown.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !burndown_config.burndown_dir.exists() {
                std::fs::create_dir_all(&burndown_config.burndown_dir)?;
            }

            BurndownToml::default().save(&config_path)?;

            println!("Created burndown.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [defaults] default_fte, capacity_mode, start");
            println!("  - [calendar] holidays");
            println!("  - [roles.overrides.\"pattern-*\"] for role-specific fallback FTE");
            println!("  - [[plan.stages]] for an explicit stage plan");
            println!();
        }
    }

    Ok(())
}
