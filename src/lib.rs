pub mod bound;
pub mod compose;
pub mod config;
pub mod graph;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod scc;
pub mod search;

pub use bound::{
    Analysis, BoundEngine, BoundError, Limits, compute_bound, compute_bound_coarse,
    compute_bound_naive, compute_critical_path,
};
pub use config::Config;
pub use graph::{FlowGraph, GraphBuilder, GraphError, UndeclaredPolicy};
pub use pipeline::{StepDefinition, load_pipeline};
pub use reference::CriticalPath;
pub use report::BoundReport;
pub use scc::{SccPartition, tarjan_scc};
