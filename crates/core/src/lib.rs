pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ringi;

pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use domain::application::{
    ApplicationId, ApplicationStatus, JobApplication, NewApplication, StatusChange,
};
pub use domain::employee::{Employee, EmployeeId, EmployeeInput, EmployeeStatus};
pub use domain::health_check::{
    HealthCheck, HealthCheckId, HealthCheckInput, HealthCheckStatus, HealthCheckSummary,
};
pub use domain::holiday::{Holiday, HolidayId, HolidayInput, HolidayKind};
pub use domain::identity::{Actor, Role};
pub use domain::job::{EmploymentType, JobId, JobPosting, JobPostingInput, JobStatus};
pub use domain::leave::{LeaveBalance, LeaveRequest, LeaveRequestId, NewLeaveRequest};
pub use domain::meeting::{Meeting, MeetingId, MeetingInput, MeetingStatus};
pub use domain::overtime::{
    Compensation, NewOvertimeRecord, OvertimeRecord, OvertimeRecordId, OvertimeStats, OvertimeType,
};
pub use domain::review::{ReviewDecision, ReviewError, ReviewStatus};
pub use domain::ringi::{
    ApproverEntry, ApproverStatus, Decision, FinalStatus, Hanko, NewApprover, NewRingi,
    RingiDocument, RingiId, Urgency,
};
pub use errors::{ApplicationError, DomainError, InterfaceError, InterfaceErrorKind};
pub use ringi::{
    DecisionInput, RequestScope, RingiTransition, RingiWorkflow, StatusCounts, WorkflowError,
};
