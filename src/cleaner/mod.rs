pub mod engine;
pub mod plan;
pub mod trash;

pub use engine::{CleanupExecutionResult, CleanupExecutor, CleanupFailure};
pub use plan::{CleanupCandidate, CleanupMode, CleanupPlan, CleanupPlanner};
pub use trash::{HoldingArea, SystemTrash, Trash};
