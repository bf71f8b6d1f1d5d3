use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Hr,
    Employee,
    Applicant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Hr => "hr",
            Self::Employee => "employee",
            Self::Applicant => "applicant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "hr" => Some(Self::Hr),
            "employee" => Some(Self::Employee),
            "applicant" => Some(Self::Applicant),
            _ => None,
        }
    }

    /// Roles that see every record instead of only their own.
    pub fn sees_all_records(&self) -> bool {
        matches!(self, Self::Admin | Self::Hr)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// The authenticated identity behind a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self { email: email.into(), name: name.into(), role }
    }

    pub fn is(&self, email: &str) -> bool {
        same_email(&self.email, email)
    }
}

pub fn same_email(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}
