pub mod engine;
pub mod projections;

pub use engine::{DecisionInput, RingiTransition, RingiWorkflow, TransitionKind, WorkflowError};
pub use projections::{
    count_by_status, filter_by_status, is_pending_for, pending_for_approver, RequestScope,
    StatusCounts,
};
