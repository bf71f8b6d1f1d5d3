use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::{same_email, Actor};
use crate::domain::review::{self, ReviewDecision, ReviewStatus};
use crate::errors::DomainError;

pub const DEFAULT_LEAVE_TYPE: &str = "年次休暇";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveRequestId(pub String);

impl LeaveRequestId {
    pub fn generate() -> Self {
        Self(format!("LV-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub employee_name: String,
    pub employee_id: String,
    pub employee_email: String,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: u32,
    pub reason: String,
    pub status: ReviewStatus,
    pub request_date: NaiveDate,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeaveRequest {
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub employee_email: Option<String>,
    #[serde(default)]
    pub leave_type: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// Number of calendar days covered by a leave, both ends included.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    let span = end.signed_duration_since(start).num_days();
    if span < 0 {
        return None;
    }
    u32::try_from(span + 1).ok()
}

impl LeaveRequest {
    /// Builds a pending request. Only administrators and HR may file on behalf of
    /// another employee; everyone else files under their own email.
    pub fn submit(
        input: NewLeaveRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::Validation("leave reason is required".to_string()));
        }
        let days = inclusive_days(input.start_date, input.end_date).ok_or_else(|| {
            DomainError::Validation("leave end date must not precede its start date".to_string())
        })?;

        let employee_email = match input.employee_email.filter(|_| actor.role.sees_all_records())
        {
            Some(email) if !email.trim().is_empty() => email.trim().to_string(),
            _ => actor.email.clone(),
        };
        let employee_name = input
            .employee_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| actor.name.clone());
        let leave_type = input
            .leave_type
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LEAVE_TYPE.to_string());

        Ok(Self {
            id: LeaveRequestId::generate(),
            employee_name,
            employee_id: input.employee_id.unwrap_or_default(),
            employee_email,
            leave_type,
            start_date: input.start_date,
            end_date: input.end_date,
            days,
            reason: reason.to_string(),
            status: ReviewStatus::Pending,
            request_date: now.date_naive(),
            reviewed_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn review(
        &mut self,
        reviewer: &Actor,
        decision: ReviewDecision,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let outcome = review::resolve(self.status, reviewer, decision, |role| role.is_admin())?;
        self.status = outcome.status;
        self.reviewed_by = Some(outcome.reviewed_by);
        self.rejection_reason = outcome.rejection_reason;
        self.updated_at = now;
        Ok(())
    }

    pub fn visible_to(&self, actor: &Actor) -> bool {
        actor.role.sees_all_records() || same_email(&self.employee_email, &actor.email)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    pub allowance_days: u32,
    pub used_days: u32,
    pub remaining_days: u32,
}

impl LeaveBalance {
    pub fn compute<'a>(
        allowance_days: u32,
        requests: impl IntoIterator<Item = &'a LeaveRequest>,
        employee_email: &str,
    ) -> Self {
        let used_days = requests
            .into_iter()
            .filter(|request| request.status == ReviewStatus::Approved)
            .filter(|request| same_email(&request.employee_email, employee_email))
            .map(|request| request.days)
            .sum::<u32>();

        Self { allowance_days, used_days, remaining_days: allowance_days.saturating_sub(used_days) }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{inclusive_days, LeaveBalance, LeaveRequest, NewLeaveRequest, DEFAULT_LEAVE_TYPE};
    use crate::domain::identity::{Actor, Role};
    use crate::domain::review::{ReviewDecision, ReviewStatus};
    use crate::errors::DomainError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn employee() -> Actor {
        Actor::new("tanaka@example.co.jp", "Tanaka Yui", Role::Employee)
    }

    fn input(start: NaiveDate, end: NaiveDate) -> NewLeaveRequest {
        NewLeaveRequest {
            employee_name: None,
            employee_id: Some("E-104".to_string()),
            employee_email: Some("someone-else@example.co.jp".to_string()),
            leave_type: None,
            start_date: start,
            end_date: end,
            reason: "family trip".to_string(),
        }
    }

    #[test]
    fn day_count_includes_both_ends() {
        assert_eq!(inclusive_days(date(2025, 5, 1), date(2025, 5, 1)), Some(1));
        assert_eq!(inclusive_days(date(2025, 4, 28), date(2025, 5, 2)), Some(5));
        assert_eq!(inclusive_days(date(2025, 5, 2), date(2025, 5, 1)), None);
    }

    #[test]
    fn employees_always_file_under_their_own_email() {
        let now = Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).single().expect("time");
        let request = LeaveRequest::submit(input(date(2025, 5, 1), date(2025, 5, 3)), &employee(), now)
            .expect("submit");

        assert_eq!(request.employee_email, "tanaka@example.co.jp");
        assert_eq!(request.employee_name, "Tanaka Yui");
        assert_eq!(request.leave_type, DEFAULT_LEAVE_TYPE);
        assert_eq!(request.days, 3);
        assert_eq!(request.status, ReviewStatus::Pending);
        assert_eq!(request.request_date, date(2025, 4, 10));
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let error = LeaveRequest::submit(input(date(2025, 5, 3), date(2025, 5, 1)), &employee(), Utc::now())
            .expect_err("reversed");
        assert!(matches!(error, DomainError::Validation(_)));
    }

    #[test]
    fn only_admins_review_leave() {
        let mut request =
            LeaveRequest::submit(input(date(2025, 5, 1), date(2025, 5, 1)), &employee(), Utc::now())
                .expect("submit");
        let hr = Actor::new("hr@example.co.jp", "Jinji", Role::Hr);
        assert!(request.review(&hr, ReviewDecision::Approve, Utc::now()).is_err());

        let admin = Actor::new("admin@example.co.jp", "Kanri", Role::Admin);
        request
            .review(&admin, ReviewDecision::Reject { reason: "busy season".to_string() }, Utc::now())
            .expect("admin rejects");
        assert_eq!(request.status, ReviewStatus::Rejected);
        assert_eq!(request.rejection_reason.as_deref(), Some("busy season"));
        assert_eq!(request.reviewed_by.as_deref(), Some("Kanri"));
    }

    #[test]
    fn balance_counts_only_approved_days_of_the_employee() {
        let admin = Actor::new("admin@example.co.jp", "Kanri", Role::Admin);
        let mut first =
            LeaveRequest::submit(input(date(2025, 5, 1), date(2025, 5, 5)), &employee(), Utc::now())
                .expect("submit");
        first.review(&admin, ReviewDecision::Approve, Utc::now()).expect("approve");
        let pending =
            LeaveRequest::submit(input(date(2025, 6, 1), date(2025, 6, 2)), &employee(), Utc::now())
                .expect("submit");
        let mut other = LeaveRequest::submit(
            input(date(2025, 5, 1), date(2025, 5, 10)),
            &Actor::new("sato@example.co.jp", "Sato", Role::Employee),
            Utc::now(),
        )
        .expect("submit");
        other.review(&admin, ReviewDecision::Approve, Utc::now()).expect("approve");

        let balance = LeaveBalance::compute(14, [&first, &pending, &other], "tanaka@example.co.jp");
        assert_eq!(balance.used_days, 5);
        assert_eq!(balance.remaining_days, 9);

        let exhausted = LeaveBalance::compute(3, [&first], "tanaka@example.co.jp");
        assert_eq!(exhausted.remaining_days, 0);
    }
}
