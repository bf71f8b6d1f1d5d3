use std::str::FromStr;

use rust_decimal::Decimal;

use hrdesk_core::domain::employee::{Employee, EmployeeId, EmployeeStatus};

use super::{
    column, decode_date, decode_enum, decode_timestamp, encode_date, encode_timestamp,
    map_unique_violation, EmployeeRepository, RepositoryError,
};
use crate::DbPool;

const EMPLOYEE_COLUMNS: &str = "id, full_name, email, phone, department, position, hire_date,
    salary, status, created_at, updated_at";

pub struct SqlEmployeeRepository {
    pool: DbPool,
}

impl SqlEmployeeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Result<Employee, RepositoryError> {
    let salary: String = column(row, "salary")?;
    let status: String = column(row, "status")?;

    Ok(Employee {
        id: EmployeeId(column(row, "id")?),
        full_name: column(row, "full_name")?,
        email: column(row, "email")?,
        phone: column(row, "phone")?,
        department: column(row, "department")?,
        position: column(row, "position")?,
        hire_date: column::<Option<String>>(row, "hire_date")?
            .map(|value| decode_date(&value))
            .transpose()?,
        salary: Decimal::from_str(&salary)
            .map_err(|e| RepositoryError::Decode(format!("invalid salary `{salary}`: {e}")))?,
        status: decode_enum("status", &status, EmployeeStatus::parse)?,
        created_at: decode_timestamp(&column::<String>(row, "created_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

#[async_trait::async_trait]
impl EmployeeRepository for SqlEmployeeRepository {
    async fn list(&self) -> Result<Vec<Employee>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employee ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_employee).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_employee).transpose()
    }

    async fn insert(&self, employee: &Employee) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO employee (id, full_name, email, phone, department, position, hire_date,
                                   salary, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&employee.id.0)
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(employee.hire_date.as_ref().map(encode_date))
        .bind(employee.salary.to_string())
        .bind(employee.status.as_str())
        .bind(encode_timestamp(&employee.created_at))
        .bind(encode_timestamp(&employee.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "employee", format!("email {}", employee.email)))?;

        Ok(())
    }

    async fn update(&self, employee: &Employee) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE employee SET
                 full_name = ?, email = ?, phone = ?, department = ?, position = ?,
                 hire_date = ?, salary = ?, status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(employee.hire_date.as_ref().map(encode_date))
        .bind(employee.salary.to_string())
        .bind(employee.status.as_str())
        .bind(encode_timestamp(&employee.updated_at))
        .bind(&employee.id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "employee", format!("email {}", employee.email)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "employee", id: employee.id.0.clone() });
        }
        Ok(())
    }

    async fn delete(&self, id: &EmployeeId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM employee WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM employee").fetch_one(&self.pool).await?)
    }
}
