//! Workday arithmetic commands (`burndown calendar`).

use anyhow::{Context, Result};

use burndown::calendar::{add_workdays, workdays_between};
use burndown::config::Config;

use super::super::CalendarCommands;

pub fn cmd_calendar(config: &Config, command: CalendarCommands) -> Result<()> {
    let calendar = config
        .burndown_config()
        .toml
        .holiday_calendar()
        .context("Invalid [calendar] section")?;

    match command {
        CalendarCommands::Add { date, days } => {
            println!("{}", add_workdays(date, days, &calendar));
        }
        CalendarCommands::Between { from, to } => {
            println!("{}", workdays_between(from, to, &calendar));
        }
    }

    Ok(())
}
