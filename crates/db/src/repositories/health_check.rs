use sqlx::{QueryBuilder, Sqlite};

use hrdesk_core::domain::health_check::{
    HealthCheck, HealthCheckId, HealthCheckStatus, HealthCheckSummary,
};

use super::{
    column, decode_date, decode_enum, decode_timestamp, encode_date, encode_timestamp,
    HealthCheckRepository, RepositoryError,
};
use crate::DbPool;

const HEALTH_CHECK_COLUMNS: &str = "id, employee_id, employee_name, employee_email,
    scheduled_date, completed_date, status, report_submitted, notes, year, created_at, updated_at";

pub struct SqlHealthCheckRepository {
    pool: DbPool,
}

impl SqlHealthCheckRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_health_check(row: &sqlx::sqlite::SqliteRow) -> Result<HealthCheck, RepositoryError> {
    let status: String = column(row, "status")?;
    let year: i64 = column(row, "year")?;

    Ok(HealthCheck {
        id: HealthCheckId(column(row, "id")?),
        employee_id: column(row, "employee_id")?,
        employee_name: column(row, "employee_name")?,
        employee_email: column(row, "employee_email")?,
        scheduled_date: decode_date(&column::<String>(row, "scheduled_date")?)?,
        completed_date: column::<Option<String>>(row, "completed_date")?
            .map(|value| decode_date(&value))
            .transpose()?,
        status: decode_enum("status", &status, HealthCheckStatus::parse)?,
        report_submitted: column::<i64>(row, "report_submitted")? != 0,
        notes: column(row, "notes")?,
        year: i32::try_from(year)
            .map_err(|_| RepositoryError::Decode(format!("invalid year {year}")))?,
        created_at: decode_timestamp(&column::<String>(row, "created_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl HealthCheckRepository for SqlHealthCheckRepository {
    async fn list(
        &self,
        year: Option<i32>,
        status: Option<HealthCheckStatus>,
    ) -> Result<Vec<HealthCheck>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {HEALTH_CHECK_COLUMNS} FROM health_check WHERE 1 = 1"));
        if let Some(year) = year {
            query.push(" AND year = ").push_bind(year);
        }
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY scheduled_date DESC, id DESC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_health_check).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(
        &self,
        id: &HealthCheckId,
    ) -> Result<Option<HealthCheck>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {HEALTH_CHECK_COLUMNS} FROM health_check WHERE id = ?"))
                .bind(&id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(row_to_health_check).transpose()
    }

    async fn insert(&self, check: &HealthCheck) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO health_check (id, employee_id, employee_name, employee_email,
                                       scheduled_date, completed_date, status, report_submitted,
                                       notes, year, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&check.id.0)
        .bind(&check.employee_id)
        .bind(&check.employee_name)
        .bind(&check.employee_email)
        .bind(encode_date(&check.scheduled_date))
        .bind(check.completed_date.as_ref().map(encode_date))
        .bind(check.status.as_str())
        .bind(i64::from(check.report_submitted))
        .bind(&check.notes)
        .bind(check.year)
        .bind(encode_timestamp(&check.created_at))
        .bind(encode_timestamp(&check.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, check: &HealthCheck) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE health_check SET
                 employee_id = ?, employee_name = ?, employee_email = ?, scheduled_date = ?,
                 completed_date = ?, status = ?, report_submitted = ?, notes = ?, year = ?,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(&check.employee_id)
        .bind(&check.employee_name)
        .bind(&check.employee_email)
        .bind(encode_date(&check.scheduled_date))
        .bind(check.completed_date.as_ref().map(encode_date))
        .bind(check.status.as_str())
        .bind(i64::from(check.report_submitted))
        .bind(&check.notes)
        .bind(check.year)
        .bind(encode_timestamp(&check.updated_at))
        .bind(&check.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "health check", id: check.id.0.clone() });
        }
        Ok(())
    }

    async fn delete(&self, id: &HealthCheckId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM health_check WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn summary(&self, year: Option<i32>) -> Result<HealthCheckSummary, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT status, COUNT(*) AS count FROM health_check");
        if let Some(year) = year {
            query.push(" WHERE year = ").push_bind(year);
        }
        query.push(" GROUP BY status");

        let rows = query.build().fetch_all(&self.pool).await?;
        let mut summary = HealthCheckSummary::default();
        for row in &rows {
            let status: String = column(row, "status")?;
            let count: i64 = column(row, "count")?;
            summary.record(
                decode_enum("status", &status, HealthCheckStatus::parse)?,
                usize::try_from(count).unwrap_or_default(),
            );
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use hrdesk_core::domain::health_check::{
        HealthCheck, HealthCheckInput, HealthCheckStatus, HealthCheckSummary,
    };

    use super::SqlHealthCheckRepository;
    use crate::repositories::test_support::setup;
    use crate::repositories::HealthCheckRepository;

    fn schedule(name: &str, on: NaiveDate, status: HealthCheckStatus) -> HealthCheck {
        HealthCheck::create(
            HealthCheckInput {
                employee_id: String::new(),
                employee_name: name.to_string(),
                employee_email: format!("{}@example.co.jp", name.to_lowercase()),
                scheduled_date: on,
                completed_date: None,
                status,
                report_submitted: false,
                notes: None,
                year: None,
            },
            Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).single().expect("time"),
        )
        .expect("health check")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[tokio::test]
    async fn completing_a_check_persists_date_and_status() {
        let repo = SqlHealthCheckRepository::new(setup().await);
        let mut check = schedule("Tanaka", date(2025, 5, 12), HealthCheckStatus::Scheduled);
        repo.insert(&check).await.expect("insert");

        check.complete(date(2025, 5, 12), Utc.with_ymd_and_hms(2025, 5, 12, 15, 0, 0).single().expect("time"));
        check.report_submitted = true;
        repo.update(&check).await.expect("update");

        let stored = repo.find_by_id(&check.id).await.expect("find").expect("exists");
        assert_eq!(stored, check);
        assert_eq!(stored.status, HealthCheckStatus::Completed);
    }

    #[tokio::test]
    async fn listing_and_summary_filter_by_year() {
        let repo = SqlHealthCheckRepository::new(setup().await);
        let checks = [
            schedule("Tanaka", date(2025, 5, 12), HealthCheckStatus::Scheduled),
            schedule("Sato", date(2025, 4, 2), HealthCheckStatus::RecheckRequired),
            schedule("Suzuki", date(2025, 6, 20), HealthCheckStatus::Pending),
            schedule("Ito", date(2024, 9, 9), HealthCheckStatus::Completed),
        ];
        for check in &checks {
            repo.insert(check).await.expect("insert");
        }

        let this_year = repo.list(Some(2025), None).await.expect("list");
        assert_eq!(
            this_year.iter().map(|c| c.employee_name.as_str()).collect::<Vec<_>>(),
            vec!["Suzuki", "Tanaka", "Sato"]
        );
        let rechecks =
            repo.list(None, Some(HealthCheckStatus::RecheckRequired)).await.expect("rechecks");
        assert_eq!(rechecks.len(), 1);

        let summary = repo.summary(Some(2025)).await.expect("summary");
        assert_eq!(summary, HealthCheckSummary::compute(&this_year));
        assert_eq!(summary.total, 3);
        assert_eq!(repo.summary(None).await.expect("all").completed, 1);
    }
}
