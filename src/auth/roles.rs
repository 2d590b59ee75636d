//! Closed set of account roles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role.
///
/// Every role-gated route and every token carries exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Receptionist,
    Patient,
    Admin,
}

/// Raised when a stored or submitted role string is outside the enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 4] = [Role::Doctor, Role::Receptionist, Role::Patient, Role::Admin];

    /// Roles that hospital staff routes accept.
    pub const STAFF: [Role; 3] = [Role::Doctor, Role::Receptionist, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
            Role::Patient => "patient",
            Role::Admin => "admin",
        }
    }

    /// Whether the public registration endpoints may create this role.
    /// Admin accounts are created by another admin or by startup bootstrap.
    pub fn is_self_registrable(&self) -> bool {
        match self {
            Role::Doctor | Role::Receptionist | Role::Patient => true,
            Role::Admin => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doctor" => Ok(Role::Doctor),
            "receptionist" => Ok(Role::Receptionist),
            "patient" => Ok(Role::Patient),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// Used by sqlx `try_from` column mapping.
impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_role_parse_is_exact() {
        assert!("Doctor".parse::<Role>().is_err());
        assert!("nurse".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Receptionist).unwrap();
        assert_eq!(json, "\"receptionist\"");

        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);

        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_admin_cannot_self_register() {
        assert!(Role::Doctor.is_self_registrable());
        assert!(Role::Receptionist.is_self_registrable());
        assert!(Role::Patient.is_self_registrable());
        assert!(!Role::Admin.is_self_registrable());
    }
}
