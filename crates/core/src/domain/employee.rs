use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn generate() -> Self {
        Self(format!("EMP-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    pub hire_date: Option<NaiveDate>,
    pub salary: Decimal,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub salary: Decimal,
    #[serde(default)]
    pub status: EmployeeStatus,
}

impl EmployeeInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.full_name.trim().is_empty() {
            return Err(DomainError::Validation("employee full name is required".to_string()));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::Validation(format!("invalid employee email `{email}`")));
        }
        if self.salary.is_sign_negative() && !self.salary.is_zero() {
            return Err(DomainError::Validation("salary must not be negative".to_string()));
        }
        Ok(())
    }
}

impl Employee {
    pub fn create(input: EmployeeInput, now: DateTime<Utc>) -> Result<Self, DomainError> {
        input.validate()?;
        Ok(Self {
            id: EmployeeId::generate(),
            full_name: input.full_name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone,
            department: input.department,
            position: input.position,
            hire_date: input.hire_date,
            salary: input.salary,
            status: input.status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, input: EmployeeInput, now: DateTime<Utc>) -> Result<(), DomainError> {
        input.validate()?;
        self.full_name = input.full_name.trim().to_string();
        self.email = input.email.trim().to_string();
        self.phone = input.phone;
        self.department = input.department;
        self.position = input.position;
        self.hire_date = input.hire_date;
        self.salary = input.salary;
        self.status = input.status;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{Employee, EmployeeInput, EmployeeStatus};

    fn input() -> EmployeeInput {
        EmployeeInput {
            full_name: "Kobayashi Emi".to_string(),
            email: "kobayashi@example.co.jp".to_string(),
            department: "経理部".to_string(),
            position: "主任".to_string(),
            salary: Decimal::new(420_000, 0),
            ..EmployeeInput::default()
        }
    }

    #[test]
    fn create_defaults_to_active() {
        let employee = Employee::create(input(), Utc::now()).expect("create");
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert!(employee.id.0.starts_with("EMP-"));
    }

    #[test]
    fn negative_salary_and_bad_email_are_rejected() {
        let mut negative = input();
        negative.salary = Decimal::new(-1, 0);
        assert!(negative.validate().is_err());

        let mut no_at = input();
        no_at.email = "kobayashi".to_string();
        assert!(no_at.validate().is_err());
    }

    #[test]
    fn apply_replaces_fields_and_touches_timestamp() {
        let created = Utc::now();
        let mut employee = Employee::create(input(), created).expect("create");
        let mut change = input();
        change.status = EmployeeStatus::Inactive;
        change.position = "課長".to_string();
        let later = created + chrono::Duration::minutes(5);

        employee.apply(change, later).expect("apply");
        assert_eq!(employee.status, EmployeeStatus::Inactive);
        assert_eq!(employee.position, "課長");
        assert_eq!(employee.updated_at, later);
        assert_eq!(employee.created_at, created);
    }
}
