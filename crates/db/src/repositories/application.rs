use sqlx::{QueryBuilder, Sqlite};

use hrdesk_core::domain::application::{ApplicationId, ApplicationStatus, JobApplication};
use hrdesk_core::domain::job::JobId;
use hrdesk_core::ringi::RequestScope;

use super::{
    column, decode_enum, decode_timestamp, email_key, encode_timestamp, ApplicationRepository,
    RepositoryError,
};
use crate::DbPool;

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_name, applicant_email, applicant_phone,
    cover_letter, cv_reference, status, review_notes, applied_at, updated_at";

pub struct SqlApplicationRepository {
    pool: DbPool,
}

impl SqlApplicationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_application(row: &sqlx::sqlite::SqliteRow) -> Result<JobApplication, RepositoryError> {
    let status: String = column(row, "status")?;

    Ok(JobApplication {
        id: ApplicationId(column(row, "id")?),
        job_id: JobId(column(row, "job_id")?),
        applicant_name: column(row, "applicant_name")?,
        applicant_email: column(row, "applicant_email")?,
        applicant_phone: column(row, "applicant_phone")?,
        cover_letter: column(row, "cover_letter")?,
        cv_reference: column(row, "cv_reference")?,
        status: decode_enum("status", &status, ApplicationStatus::parse)?,
        review_notes: column(row, "review_notes")?,
        applied_at: decode_timestamp(&column::<String>(row, "applied_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl ApplicationRepository for SqlApplicationRepository {
    async fn list(
        &self,
        scope: &RequestScope,
        job_id: Option<&JobId>,
    ) -> Result<Vec<JobApplication>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_application WHERE 1 = 1"
        ));
        if let RequestScope::Own(email) = scope {
            query.push(" AND lower(applicant_email) = ").push_bind(email_key(email));
        }
        if let Some(job_id) = job_id {
            query.push(" AND job_id = ").push_bind(job_id.0.clone());
        }
        query.push(" ORDER BY applied_at DESC, id DESC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_application).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_application WHERE id = ?"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_application).transpose()
    }

    async fn insert(&self, application: &JobApplication) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO job_application (id, job_id, applicant_name, applicant_email,
                                          applicant_phone, cover_letter, cv_reference, status,
                                          review_notes, applied_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&application.id.0)
        .bind(&application.job_id.0)
        .bind(&application.applicant_name)
        .bind(&application.applicant_email)
        .bind(&application.applicant_phone)
        .bind(&application.cover_letter)
        .bind(&application.cv_reference)
        .bind(application.status.as_str())
        .bind(&application.review_notes)
        .bind(encode_timestamp(&application.applied_at))
        .bind(encode_timestamp(&application.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_status(&self, application: &JobApplication) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE job_application SET status = ?, review_notes = ?, updated_at = ?
             WHERE id = ? AND status NOT IN ('hired', 'rejected')",
        )
        .bind(application.status.as_str())
        .bind(&application.review_notes)
        .bind(encode_timestamp(&application.updated_at))
        .bind(&application.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict {
                entity: "application",
                id: application.id.0.clone(),
            });
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM job_application").fetch_one(&self.pool).await?)
    }
}
