use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite};

use hrdesk_core::domain::job::{EmploymentType, JobId, JobPosting, JobStatus};

use super::{column, decode_enum, decode_timestamp, encode_timestamp, JobRepository, RepositoryError};
use crate::DbPool;

const JOB_COLUMNS: &str = "id, title, department, location, employment_type, salary, description,
    requirements, status, posted_by, posted_date, created_at, updated_at";

pub struct SqlJobRepository {
    pool: DbPool,
}

impl SqlJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<JobPosting, RepositoryError> {
    let employment_type: String = column(row, "employment_type")?;
    let status: String = column(row, "status")?;
    let salary = column::<Option<String>>(row, "salary")?
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|e| RepositoryError::Decode(format!("invalid salary `{raw}`: {e}")))
        })
        .transpose()?;

    Ok(JobPosting {
        id: JobId(column(row, "id")?),
        title: column(row, "title")?,
        department: column(row, "department")?,
        location: column(row, "location")?,
        employment_type: decode_enum("employment_type", &employment_type, EmploymentType::parse)?,
        salary,
        description: column(row, "description")?,
        requirements: column(row, "requirements")?,
        status: decode_enum("status", &status, JobStatus::parse)?,
        posted_by: column(row, "posted_by")?,
        posted_date: decode_timestamp(&column::<String>(row, "posted_date")?)?,
        created_at: decode_timestamp(&column::<String>(row, "created_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl JobRepository for SqlJobRepository {
    async fn list(&self, status: Option<JobStatus>) -> Result<Vec<JobPosting>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM job_posting"));
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY posted_date DESC, id DESC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_job).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM job_posting WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_job).transpose()
    }

    async fn insert(&self, job: &JobPosting) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO job_posting (id, title, department, location, employment_type, salary,
                                      description, requirements, status, posted_by, posted_date,
                                      created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&job.id.0)
        .bind(&job.title)
        .bind(&job.department)
        .bind(&job.location)
        .bind(job.employment_type.as_str())
        .bind(job.salary.map(|salary| salary.to_string()))
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(job.status.as_str())
        .bind(&job.posted_by)
        .bind(encode_timestamp(&job.posted_date))
        .bind(encode_timestamp(&job.created_at))
        .bind(encode_timestamp(&job.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, job: &JobPosting) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE job_posting SET
                 title = ?, department = ?, location = ?, employment_type = ?, salary = ?,
                 description = ?, requirements = ?, status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&job.title)
        .bind(&job.department)
        .bind(&job.location)
        .bind(job.employment_type.as_str())
        .bind(job.salary.map(|salary| salary.to_string()))
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(job.status.as_str())
        .bind(encode_timestamp(&job.updated_at))
        .bind(&job.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "job", id: job.id.0.clone() });
        }
        Ok(())
    }

    /// Applications for the posting go with it.
    async fn delete(&self, id: &JobId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM job_posting WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM job_posting WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use hrdesk_core::domain::job::{JobPosting, JobPostingInput, JobStatus};

    use super::SqlJobRepository;
    use crate::repositories::test_support::setup;
    use crate::repositories::JobRepository;

    fn posting(title: &str, days_ago: i64, status: JobStatus) -> JobPosting {
        let posted = Utc.with_ymd_and_hms(2026, 4, 30, 9, 0, 0).single().expect("time")
            - Duration::days(days_ago);
        JobPosting::create(
            JobPostingInput {
                title: title.to_string(),
                department: "開発部".to_string(),
                description: format!("{title} role"),
                status,
                ..JobPostingInput::default()
            },
            "jinji@example.co.jp",
            posted,
        )
        .expect("job")
    }

    #[tokio::test]
    async fn salary_round_trips_including_absent() {
        let repo = SqlJobRepository::new(setup().await);
        let mut paid = posting("Designer", 1, JobStatus::Active);
        paid.salary = Some(Decimal::new(5_500_000, 0));
        let unpaid = posting("Intern", 2, JobStatus::Active);
        repo.insert(&paid).await.expect("insert");
        repo.insert(&unpaid).await.expect("insert");

        assert_eq!(repo.find_by_id(&paid.id).await.expect("find"), Some(paid));
        let stored = repo.find_by_id(&unpaid.id).await.expect("find").expect("exists");
        assert_eq!(stored.salary, None);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_filters_by_status() {
        let repo = SqlJobRepository::new(setup().await);
        for job in [
            posting("Older", 10, JobStatus::Active),
            posting("Newest", 0, JobStatus::Active),
            posting("Filled", 5, JobStatus::Closed),
        ] {
            repo.insert(&job).await.expect("insert");
        }

        let active = repo.list(Some(JobStatus::Active)).await.expect("list");
        assert_eq!(
            active.iter().map(|job| job.title.as_str()).collect::<Vec<_>>(),
            vec!["Newest", "Older"]
        );
        assert_eq!(repo.list(None).await.expect("all").len(), 3);
        assert_eq!(repo.count_by_status(JobStatus::Active).await.expect("count"), 2);
        assert_eq!(repo.count_by_status(JobStatus::Closed).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let repo = SqlJobRepository::new(setup().await);
        let mut job = posting("Analyst", 0, JobStatus::Active);
        assert!(repo.update(&job).await.is_err());

        repo.insert(&job).await.expect("insert");
        job.status = JobStatus::Closed;
        repo.update(&job).await.expect("update");
        assert_eq!(repo.count_by_status(JobStatus::Closed).await.expect("count"), 1);

        assert!(repo.delete(&job.id).await.expect("delete"));
        assert!(!repo.delete(&job.id).await.expect("second delete"));
    }
}
