//! Delivery forecast and burndown chart commands.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

use burndown::config::Config;
use burndown::forecast::{Forecast, Forecaster};
use burndown::project::ProjectFile;
use burndown::projector::{DeliveryStatus, FteSource};

use super::project::file_stem;

fn load_projects(config: &Config, project: Option<&str>) -> Result<Vec<(PathBuf, ProjectFile)>> {
    let files = match project {
        Some(name) => vec![config.resolve_project(name)?],
        None => config.project_files()?,
    };

    files
        .into_iter()
        .map(|file| {
            let project = ProjectFile::load(&file)?;
            Ok((file, project))
        })
        .collect()
}

pub fn cmd_forecast(config: &Config, project: Option<&str>, json: bool) -> Result<()> {
    let forecaster = Forecaster::new(config.burndown_config(), config.today)?;
    let projects = load_projects(config, project)?;

    if projects.is_empty() {
        bail!(
            "No projects found in {}. Run 'burndown init --sample' or copy exports there.",
            config.projects_dir.display()
        );
    }

    let mut forecasts = Vec::with_capacity(projects.len());
    for (file, project) in &projects {
        forecasts.push((file, forecaster.forecast(project)?));
    }

    if json {
        let reports: Vec<&Forecast> = forecasts.iter().map(|(_, f)| f).collect();
        if project.is_some() && reports.len() == 1 {
            println!("{}", serde_json::to_string_pretty(reports[0])?);
        } else {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        return Ok(());
    }

    for (file, forecast) in &forecasts {
        print_forecast(&file_stem(file), forecast);
    }

    Ok(())
}

fn print_forecast(file: &str, forecast: &Forecast) {
    let projection = &forecast.projection;

    println!();
    println!(
        "{} ({})",
        console::style(&forecast.project_name).bold().cyan(),
        file
    );
    println!(
        "  Start:     {} ({})",
        projection.start_date, forecast.start_policy
    );
    println!("  Capacity:  {}", forecast.capacity_mode);
    println!(
        "  Delivery:  {} ({} workdays)",
        projection.calculated_delivery_date, projection.total_workdays
    );

    match (projection.target_delivery_date, projection.diff_workdays) {
        (Some(target), Some(diff)) => {
            println!("  Target:    {}", target);
            let status = format!("{} ({:+} workdays)", forecast.status, diff);
            let styled = match forecast.status {
                DeliveryStatus::Late => console::style(status).red().bold(),
                _ => console::style(status).green(),
            };
            println!("  Status:    {}", styled);
        }
        _ => {
            println!("  Target:    -");
            println!("  Status:    {}", console::style(forecast.status).dim());
        }
    }

    if !projection.schedule.is_empty() {
        println!();
        println!(
            "  {:<6} {:<12} {:<10} {:<10} {:<6} {:<8} {:<11} End",
            "Stage", "Role", "Kind", "Remaining", "FTE", "Days", "Start"
        );
        for role in &projection.schedule {
            let fte = format!("{:.2}", role.fte);
            let fte = match role.fte_source {
                FteSource::Default => {
                    console::style(format!("{}*", fte)).yellow().to_string()
                }
                FteSource::Team => fte,
            };
            println!(
                "  {:<6} {:<12} {:<10} {:<10.1} {:<6} {:<8.1} {:<11} {}",
                role.stage + 1,
                role.role,
                role.stage_kind.to_string(),
                role.remaining_mandays,
                fte,
                role.duration_days,
                role.start_date.to_string(),
                role.end_date
            );
        }
    }

    if !forecast.warnings.is_empty() {
        println!();
        for warning in &forecast.warnings {
            println!("  {} {}", console::style("⚠").yellow(), warning);
        }
    }
    println!();
}

pub fn cmd_chart(config: &Config, project: &str, json: bool) -> Result<()> {
    let forecaster = Forecaster::new(config.burndown_config(), config.today)?;
    let path = config.resolve_project(project)?;
    let project = ProjectFile::load(&path)?;

    let forecast = forecaster.forecast(&project)?;
    let chart = forecaster.chart(&project, &forecast);

    if json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
        return Ok(());
    }

    let mut rows: BTreeMap<NaiveDate, [Option<f64>; 3]> = BTreeMap::new();
    for point in &chart.ideal {
        rows.entry(point.date).or_default()[0] = Some(point.remaining_mandays);
    }
    for point in &chart.actual {
        rows.entry(point.date).or_default()[1] = Some(point.remaining_mandays);
    }
    for point in &chart.projected {
        rows.entry(point.date).or_default()[2] = Some(point.remaining_mandays);
    }

    println!();
    println!("{}", console::style(&project.name).bold().cyan());
    println!(
        "  Scope: {:.1} mandays, {:.1} remaining",
        chart.total_mandays, chart.remaining_mandays
    );
    println!();
    println!("  {:<11} {:>8} {:>8} {:>10}", "Date", "Ideal", "Actual", "Projected");
    for (date, [ideal, actual, projected]) in &rows {
        println!(
            "  {:<11} {:>8} {:>8} {:>10}",
            date.to_string(),
            cell(*ideal),
            cell(*actual),
            cell(*projected)
        );
    }
    println!();

    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}
