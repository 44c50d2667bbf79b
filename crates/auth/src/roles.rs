use core::str::FromStr;

use serde::{Deserialize, Serialize};

use schoolerp_core::DomainError;

/// Role of a principal within its school.
///
/// Fixed enumeration; every principal holds exactly one role for the whole
/// session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Registrar,
    Finance,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Registrar,
        Role::Finance,
        Role::Teacher,
        Role::Student,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Registrar => "REGISTRAR",
            Role::Finance => "FINANCE",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin => "School administrator with full access inside their school",
            Role::Registrar => "Back-office staff managing academic structure and enrollment",
            Role::Finance => "Back-office staff managing fees, invoices and payments",
            Role::Teacher => "Teaching staff; writes attendance and grades for assigned classes",
            Role::Student => "Read-only access to the student's own records",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == upper)
            .ok_or_else(|| DomainError::validation(format!("unknown role '{s}'")))
    }
}
