use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite};

use hrdesk_core::domain::overtime::{Compensation, OvertimeRecord, OvertimeRecordId, OvertimeType};
use hrdesk_core::domain::review::ReviewStatus;
use hrdesk_core::ringi::RequestScope;

use super::{
    column, decode_date, decode_enum, decode_timestamp, email_key, encode_date, encode_timestamp,
    OvertimeRepository, RepositoryError,
};
use crate::DbPool;

const OVERTIME_COLUMNS: &str = "id, employee_id, employee_name, employee_email, work_date,
    start_time, end_time, hours, overtime_type, compensation, reason, status, reviewed_by,
    rejection_reason, created_at, updated_at";

const CLOCK_FORMAT: &str = "%H:%M";

pub struct SqlOvertimeRepository {
    pool: DbPool,
}

impl SqlOvertimeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_clock(value: &str) -> Result<NaiveTime, RepositoryError> {
    NaiveTime::parse_from_str(value, CLOCK_FORMAT)
        .map_err(|e| RepositoryError::Decode(format!("invalid clock time `{value}`: {e}")))
}

fn row_to_overtime(row: &sqlx::sqlite::SqliteRow) -> Result<OvertimeRecord, RepositoryError> {
    let hours: String = column(row, "hours")?;
    let overtime_type: String = column(row, "overtime_type")?;
    let compensation: String = column(row, "compensation")?;
    let status: String = column(row, "status")?;

    Ok(OvertimeRecord {
        id: OvertimeRecordId(column(row, "id")?),
        employee_id: column(row, "employee_id")?,
        employee_name: column(row, "employee_name")?,
        employee_email: column(row, "employee_email")?,
        date: decode_date(&column::<String>(row, "work_date")?)?,
        start_time: decode_clock(&column::<String>(row, "start_time")?)?,
        end_time: decode_clock(&column::<String>(row, "end_time")?)?,
        hours: Decimal::from_str(&hours)
            .map_err(|e| RepositoryError::Decode(format!("invalid hours `{hours}`: {e}")))?,
        overtime_type: decode_enum("overtime_type", &overtime_type, OvertimeType::parse)?,
        compensation: decode_enum("compensation", &compensation, Compensation::parse)?,
        reason: column(row, "reason")?,
        status: decode_enum("status", &status, ReviewStatus::parse)?,
        reviewed_by: column(row, "reviewed_by")?,
        rejection_reason: column(row, "rejection_reason")?,
        created_at: decode_timestamp(&column::<String>(row, "created_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl OvertimeRepository for SqlOvertimeRepository {
    async fn list(
        &self,
        scope: &RequestScope,
        month: Option<&str>,
    ) -> Result<Vec<OvertimeRecord>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {OVERTIME_COLUMNS} FROM overtime_record WHERE 1 = 1"));
        if let RequestScope::Own(email) = scope {
            query.push(" AND lower(employee_email) = ").push_bind(email_key(email));
        }
        if let Some(month) = month {
            query.push(" AND substr(work_date, 1, 7) = ").push_bind(month.to_string());
        }
        query.push(" ORDER BY work_date DESC, created_at DESC, id DESC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_overtime).collect::<Result<Vec<_>, _>>()
    }

    async fn list_between(
        &self,
        employee_email: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OvertimeRecord>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {OVERTIME_COLUMNS} FROM overtime_record
             WHERE lower(employee_email) = ? AND work_date >= ? AND work_date <= ?
             ORDER BY work_date ASC, id ASC"
        ))
        .bind(email_key(employee_email))
        .bind(encode_date(&from))
        .bind(encode_date(&to))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_overtime).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(
        &self,
        id: &OvertimeRecordId,
    ) -> Result<Option<OvertimeRecord>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {OVERTIME_COLUMNS} FROM overtime_record WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(row_to_overtime).transpose()
    }

    async fn insert(&self, record: &OvertimeRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO overtime_record (id, employee_id, employee_name, employee_email, work_date,
                                          start_time, end_time, hours, overtime_type, compensation,
                                          reason, status, reviewed_by, rejection_reason,
                                          created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id.0)
        .bind(&record.employee_id)
        .bind(&record.employee_name)
        .bind(&record.employee_email)
        .bind(encode_date(&record.date))
        .bind(record.start_time.format(CLOCK_FORMAT).to_string())
        .bind(record.end_time.format(CLOCK_FORMAT).to_string())
        .bind(record.hours.to_string())
        .bind(record.overtime_type.as_str())
        .bind(record.compensation.as_str())
        .bind(&record.reason)
        .bind(record.status.as_str())
        .bind(&record.reviewed_by)
        .bind(&record.rejection_reason)
        .bind(encode_timestamp(&record.created_at))
        .bind(encode_timestamp(&record.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_review(&self, record: &OvertimeRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE overtime_record
             SET status = ?, reviewed_by = ?, rejection_reason = ?, updated_at = ?
             WHERE id = ? AND status = 'pending'",
        )
        .bind(record.status.as_str())
        .bind(&record.reviewed_by)
        .bind(&record.rejection_reason)
        .bind(encode_timestamp(&record.updated_at))
        .bind(&record.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }
        let id = record.id.0.clone();
        match self.find_by_id(&record.id).await? {
            Some(_) => Err(RepositoryError::Conflict { entity: "overtime record", id }),
            None => Err(RepositoryError::NotFound { entity: "overtime record", id }),
        }
    }

    async fn delete(&self, id: &OvertimeRecordId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM overtime_record WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self, status: ReviewStatus) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM overtime_record WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?)
    }
}
