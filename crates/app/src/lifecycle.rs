//! Lifecycle engine — executes transitions and controls when runs happen.

pub mod executor;
pub mod scheduler;

pub use executor::{
    BatchAborted, Halt, StopSignal, TransitionContext, TransitionExecutor, TransitionKind,
    TransitionOutcome,
};
pub use scheduler::{LifecycleScheduler, RunState, SchedulerSettings};
