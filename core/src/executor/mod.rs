//! Task graph planning and concurrent execution
//!
//! # Architecture
//!
//! ```text
//! TaskSelection
//!   ↓
//! TaskGraph::build()  → closure, cycle detection, exclusion policy
//!   ↓
//! TaskGraph { nodes, dependents, stages }
//!   ↓
//! TaskGraphExecutor::execute()
//!   ├─ WorkerLeasePool           (bounded parallelism)
//!   ├─ ResourceLockCoordinator   (shared mutable state, sorted acquisition)
//!   └─ BuildCancellationToken    (cooperative stop)
//!   ↓
//! BuildReport
//! ```

mod cancel;
mod engine;
mod graph;
mod lease;
mod locks;
mod progress;
mod state;
pub mod traits;
pub mod types;

pub use cancel::{BuildCancellationToken, CancelReason};
pub use engine::TaskGraphExecutor;
pub use graph::{TaskGraph, TaskNode};
pub use lease::{WorkerLease, WorkerLeasePool};
pub use locks::{ResourceLock, ResourceLockCoordinator};
pub use progress::ProgressMonitor;
pub use state::TaskState;
pub use traits::{ExecutionListener, OutputRendererPlugin, RenderEvent};
pub use types::{BuildReport, ExecutionOpts, TaskOutcome};
