use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use hrdesk_core::domain::meeting::{Meeting, MeetingId, MeetingStatus};
use hrdesk_core::ringi::RequestScope;

use super::{
    column, decode_enum, decode_timestamp, email_key, encode_timestamp, MeetingRepository,
    RepositoryError,
};
use crate::DbPool;

const MEETING_COLUMNS: &str = "id, title, description, agenda, scheduled_at, duration_minutes,
    organizer_name, organizer_email, participants_json, meeting_url, status, notes,
    created_at, updated_at";

pub struct SqlMeetingRepository {
    pool: DbPool,
}

impl SqlMeetingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_meeting(row: &sqlx::sqlite::SqliteRow) -> Result<Meeting, RepositoryError> {
    let participants_json: String = column(row, "participants_json")?;
    let participants: Vec<String> = serde_json::from_str(&participants_json)
        .map_err(|e| RepositoryError::Decode(format!("participants: {e}")))?;
    let duration: i64 = column(row, "duration_minutes")?;
    let status: String = column(row, "status")?;

    Ok(Meeting {
        id: MeetingId(column(row, "id")?),
        title: column(row, "title")?,
        description: column(row, "description")?,
        agenda: column(row, "agenda")?,
        scheduled_at: decode_timestamp(&column::<String>(row, "scheduled_at")?)?,
        duration_minutes: u32::try_from(duration)
            .map_err(|_| RepositoryError::Decode(format!("invalid duration {duration}")))?,
        organizer_name: column(row, "organizer_name")?,
        organizer_email: column(row, "organizer_email")?,
        participants,
        meeting_url: column(row, "meeting_url")?,
        status: decode_enum("status", &status, MeetingStatus::parse)?,
        notes: column(row, "notes")?,
        created_at: decode_timestamp(&column::<String>(row, "created_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

fn encode_participants(meeting: &Meeting) -> Result<String, RepositoryError> {
    serde_json::to_string(&meeting.participants)
        .map_err(|e| RepositoryError::Decode(format!("participants: {e}")))
}

#[async_trait::async_trait]
impl MeetingRepository for SqlMeetingRepository {
    async fn list(
        &self,
        scope: &RequestScope,
        status: Option<MeetingStatus>,
    ) -> Result<Vec<Meeting>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {MEETING_COLUMNS} FROM meeting WHERE 1 = 1"));
        if let RequestScope::Own(email) = scope {
            let key = email_key(email);
            query
                .push(" AND (lower(organizer_email) = ")
                .push_bind(key.clone())
                .push(
                    " OR EXISTS (SELECT 1 FROM json_each(meeting.participants_json)
                                 WHERE lower(trim(json_each.value)) = ",
                )
                .push_bind(key)
                .push("))");
        }
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY scheduled_at ASC, id ASC");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_meeting).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &MeetingId) -> Result<Option<Meeting>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {MEETING_COLUMNS} FROM meeting WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_meeting).transpose()
    }

    async fn insert(&self, meeting: &Meeting) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO meeting (id, title, description, agenda, scheduled_at, duration_minutes,
                                  organizer_name, organizer_email, participants_json, meeting_url,
                                  status, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&meeting.id.0)
        .bind(&meeting.title)
        .bind(&meeting.description)
        .bind(&meeting.agenda)
        .bind(encode_timestamp(&meeting.scheduled_at))
        .bind(i64::from(meeting.duration_minutes))
        .bind(&meeting.organizer_name)
        .bind(&meeting.organizer_email)
        .bind(encode_participants(meeting)?)
        .bind(&meeting.meeting_url)
        .bind(meeting.status.as_str())
        .bind(&meeting.notes)
        .bind(encode_timestamp(&meeting.created_at))
        .bind(encode_timestamp(&meeting.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, meeting: &Meeting) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE meeting SET
                 title = ?, description = ?, agenda = ?, scheduled_at = ?, duration_minutes = ?,
                 participants_json = ?, meeting_url = ?, status = ?, notes = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&meeting.title)
        .bind(&meeting.description)
        .bind(&meeting.agenda)
        .bind(encode_timestamp(&meeting.scheduled_at))
        .bind(i64::from(meeting.duration_minutes))
        .bind(encode_participants(meeting)?)
        .bind(&meeting.meeting_url)
        .bind(meeting.status.as_str())
        .bind(&meeting.notes)
        .bind(encode_timestamp(&meeting.updated_at))
        .bind(&meeting.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "meeting", id: meeting.id.0.clone() });
        }
        Ok(())
    }

    async fn delete(&self, id: &MeetingId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM meeting WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM meeting
             WHERE scheduled_at >= ? AND scheduled_at < ? AND status != 'cancelled'",
        )
        .bind(encode_timestamp(&start))
        .bind(encode_timestamp(&end))
        .fetch_one(&self.pool)
        .await?)
    }
}
