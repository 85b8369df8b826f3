//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `project`       | `Init`, `List`                                     |
//! | `forecast`      | `Forecast`, `Chart`                                |
//! | `calendar`      | `Calendar`                                         |
//! | `config`        | `Config`                                           |

pub mod calendar;
pub mod config;
pub mod forecast;
pub mod project;

pub use calendar::cmd_calendar;
pub use config::cmd_config;
pub use forecast::{cmd_chart, cmd_forecast};
pub use project::{cmd_init, cmd_list};
