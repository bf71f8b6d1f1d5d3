use hrdesk_core::domain::leave::{LeaveRequest, LeaveRequestId};
use hrdesk_core::domain::review::ReviewStatus;
use hrdesk_core::ringi::RequestScope;

use super::{
    column, decode_date, decode_enum, decode_timestamp, email_key, encode_date, encode_timestamp,
    LeaveRepository, RepositoryError,
};
use crate::DbPool;

const LEAVE_COLUMNS: &str = "id, employee_name, employee_id, employee_email, leave_type,
    start_date, end_date, days, reason, status, request_date, reviewed_by, rejection_reason,
    created_at, updated_at";

pub struct SqlLeaveRepository {
    pool: DbPool,
}

impl SqlLeaveRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_leave(row: &sqlx::sqlite::SqliteRow) -> Result<LeaveRequest, RepositoryError> {
    let days: i64 = column(row, "days")?;
    let status: String = column(row, "status")?;

    Ok(LeaveRequest {
        id: LeaveRequestId(column(row, "id")?),
        employee_name: column(row, "employee_name")?,
        employee_id: column(row, "employee_id")?,
        employee_email: column(row, "employee_email")?,
        leave_type: column(row, "leave_type")?,
        start_date: decode_date(&column::<String>(row, "start_date")?)?,
        end_date: decode_date(&column::<String>(row, "end_date")?)?,
        days: u32::try_from(days)
            .map_err(|_| RepositoryError::Decode(format!("invalid day count {days}")))?,
        reason: column(row, "reason")?,
        status: decode_enum("status", &status, ReviewStatus::parse)?,
        request_date: decode_date(&column::<String>(row, "request_date")?)?,
        reviewed_by: column(row, "reviewed_by")?,
        rejection_reason: column(row, "rejection_reason")?,
        created_at: decode_timestamp(&column::<String>(row, "created_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl LeaveRepository for SqlLeaveRepository {
    async fn list(&self, scope: &RequestScope) -> Result<Vec<LeaveRequest>, RepositoryError> {
        let rows = match scope {
            RequestScope::All => {
                sqlx::query(&format!(
                    "SELECT {LEAVE_COLUMNS} FROM leave_request ORDER BY created_at DESC, id DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            RequestScope::Own(email) => {
                sqlx::query(&format!(
                    "SELECT {LEAVE_COLUMNS} FROM leave_request
                     WHERE lower(employee_email) = ?
                     ORDER BY created_at DESC, id DESC"
                ))
                .bind(email_key(email))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_leave).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(
        &self,
        id: &LeaveRequestId,
    ) -> Result<Option<LeaveRequest>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {LEAVE_COLUMNS} FROM leave_request WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_leave).transpose()
    }

    async fn insert(&self, request: &LeaveRequest) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO leave_request (id, employee_name, employee_id, employee_email, leave_type,
                                        start_date, end_date, days, reason, status, request_date,
                                        reviewed_by, rejection_reason, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id.0)
        .bind(&request.employee_name)
        .bind(&request.employee_id)
        .bind(&request.employee_email)
        .bind(&request.leave_type)
        .bind(encode_date(&request.start_date))
        .bind(encode_date(&request.end_date))
        .bind(i64::from(request.days))
        .bind(&request.reason)
        .bind(request.status.as_str())
        .bind(encode_date(&request.request_date))
        .bind(&request.reviewed_by)
        .bind(&request.rejection_reason)
        .bind(encode_timestamp(&request.created_at))
        .bind(encode_timestamp(&request.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_review(&self, request: &LeaveRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE leave_request
             SET status = ?, reviewed_by = ?, rejection_reason = ?, updated_at = ?
             WHERE id = ? AND status = 'pending'",
        )
        .bind(request.status.as_str())
        .bind(&request.reviewed_by)
        .bind(&request.rejection_reason)
        .bind(encode_timestamp(&request.updated_at))
        .bind(&request.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(&request.id).await? {
                Some(_) => {
                    Err(RepositoryError::Conflict { entity: "leave request", id: request.id.0.clone() })
                }
                None => {
                    Err(RepositoryError::NotFound { entity: "leave request", id: request.id.0.clone() })
                }
            };
        }
        Ok(())
    }

    async fn count_by_status(&self, status: ReviewStatus) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM leave_request WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?)
    }
}
