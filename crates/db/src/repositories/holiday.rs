use hrdesk_core::domain::holiday::{Holiday, HolidayId, HolidayKind};

use super::{
    column, decode_date, decode_enum, decode_timestamp, encode_date, encode_timestamp,
    map_unique_violation, HolidayRepository, RepositoryError,
};
use crate::DbPool;

const HOLIDAY_COLUMNS: &str =
    "id, holiday_date, name, kind, description, year, created_by, created_at, updated_at";

pub struct SqlHolidayRepository {
    pool: DbPool,
}

impl SqlHolidayRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_holiday(row: &sqlx::sqlite::SqliteRow) -> Result<Holiday, RepositoryError> {
    let kind: String = column(row, "kind")?;
    let year: i64 = column(row, "year")?;

    Ok(Holiday {
        id: HolidayId(column(row, "id")?),
        date: decode_date(&column::<String>(row, "holiday_date")?)?,
        name: column(row, "name")?,
        kind: decode_enum("kind", &kind, HolidayKind::parse)?,
        description: column(row, "description")?,
        year: i32::try_from(year)
            .map_err(|_| RepositoryError::Decode(format!("invalid year {year}")))?,
        created_by: column(row, "created_by")?,
        created_at: decode_timestamp(&column::<String>(row, "created_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

fn duplicate_detail(holiday: &Holiday) -> String {
    format!("{} on {}", holiday.name, encode_date(&holiday.date))
}

#[async_trait::async_trait]
impl HolidayRepository for SqlHolidayRepository {
    async fn list_by_year(&self, year: i32) -> Result<Vec<Holiday>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {HOLIDAY_COLUMNS} FROM holiday WHERE year = ? ORDER BY holiday_date ASC, name ASC"
        ))
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_holiday).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &HolidayId) -> Result<Option<Holiday>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {HOLIDAY_COLUMNS} FROM holiday WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_holiday).transpose()
    }

    async fn insert(&self, holiday: &Holiday) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO holiday (id, holiday_date, name, kind, description, year, created_by,
                                  created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&holiday.id.0)
        .bind(encode_date(&holiday.date))
        .bind(&holiday.name)
        .bind(holiday.kind.as_str())
        .bind(&holiday.description)
        .bind(holiday.year)
        .bind(&holiday.created_by)
        .bind(encode_timestamp(&holiday.created_at))
        .bind(encode_timestamp(&holiday.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "holiday", duplicate_detail(holiday)))?;

        Ok(())
    }

    async fn insert_if_absent(&self, holiday: &Holiday) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO holiday (id, holiday_date, name, kind, description, year, created_by,
                                  created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(holiday_date, name) DO NOTHING",
        )
        .bind(&holiday.id.0)
        .bind(encode_date(&holiday.date))
        .bind(&holiday.name)
        .bind(holiday.kind.as_str())
        .bind(&holiday.description)
        .bind(holiday.year)
        .bind(&holiday.created_by)
        .bind(encode_timestamp(&holiday.created_at))
        .bind(encode_timestamp(&holiday.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, holiday: &Holiday) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE holiday
             SET holiday_date = ?, name = ?, kind = ?, description = ?, year = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(encode_date(&holiday.date))
        .bind(&holiday.name)
        .bind(holiday.kind.as_str())
        .bind(&holiday.description)
        .bind(holiday.year)
        .bind(encode_timestamp(&holiday.updated_at))
        .bind(&holiday.id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "holiday", duplicate_detail(holiday)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "holiday", id: holiday.id.0.clone() });
        }
        Ok(())
    }

    async fn delete(&self, id: &HolidayId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM holiday WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_for_year(&self, year: i32) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM holiday WHERE year = ?")
            .bind(year)
            .fetch_one(&self.pool)
            .await?)
    }
}
