pub mod hibernation;
pub mod merge_options;
pub mod merge_runner;
pub mod merge_scanner;
pub mod merge_task;
pub mod step_budget;

pub use hibernation::{HibernatedMerge, MergeSnapshot};
pub use merge_options::{MergeInputs, MergeOptions};
pub use merge_runner::merge;
pub use merge_scanner::{BurstOutcome, MergePhase, MergeScanner};
pub use merge_task::{MergeHandle, spawn_merge};
pub use step_budget::{StepBudget, StepDone, StepStatus, StepToken};
