//! Role dependencies.
//!
//! Roles either work side by side or wait for other roles to finish (QA after
//! FE/BE is the usual case). Two ways to describe that are supported:
//!
//! 1. **Graph** - each role lists the roles it `depends_on`; `RoleGraphBuilder`
//!    validates it and `DependencyPlan::from_graph` turns its waves into
//!    parallel stages.
//! 2. **Plan** - an explicit ordered list of stages, each either parallel or a
//!    sequential chain.
//!
//! ## Example
//!
//! ```
//! use burndown::roles::{DependencyPlan, RoleGraphBuilder, RoleSpec};
//!
//! let graph = RoleGraphBuilder::new(vec![
//!     RoleSpec::new("fe", vec![]),
//!     RoleSpec::new("be", vec![]),
//!     RoleSpec::new("qa", vec!["fe".to_string(), "be".to_string()]),
//! ])
//! .build()?;
//!
//! let plan = DependencyPlan::from_graph(&graph);
//! // Stage 0: [fe, be], Stage 1: [qa]
//! assert_eq!(plan.stages.len(), 2);
//! # Ok::<(), burndown::errors::RoleGraphError>(())
//! ```

mod builder;
mod plan;

pub use builder::{RoleGraph, RoleGraphBuilder, RoleIndex, RoleSpec};
pub use plan::{DependencyPlan, Stage, StageKind};

/// Default roles of a delivery team: FE and BE in parallel, QA afterwards.
pub fn default_roles() -> Vec<RoleSpec> {
    vec![
        RoleSpec::new("fe", vec![])
            .with_label("Frontend")
            .with_color("#3b82f6"),
        RoleSpec::new("be", vec![])
            .with_label("Backend")
            .with_color("#10b981"),
        RoleSpec::new("qa", vec!["fe".to_string(), "be".to_string()])
            .with_label("QA")
            .with_color("#f59e0b"),
    ]
}
