// role.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Posición ordenada de un actor dentro del flujo de aprobación.
///
/// Los códigos (`user`, `dev`, `ba`, `pm`) son los que se persisten en base de
/// datos y en las definiciones de campos; el nombre visible sólo se usa en la
/// capa de presentación y en los correos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    Representative,
    #[serde(rename = "dev")]
    Champion,
    #[serde(rename = "ba")]
    Approver,
    #[serde(rename = "pm")]
    Executive,
}

impl Role {
    /// All roles in approval order.
    pub const ALL: [Role; 4] = [Role::Representative, Role::Champion, Role::Approver, Role::Executive];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Representative => "user",
            Self::Champion => "dev",
            Self::Approver => "ba",
            Self::Executive => "pm",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Representative => "Risk Representative",
            Self::Champion => "Risk Champion",
            Self::Approver => "Risk Approver",
            Self::Executive => "CRO",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        match code {
            "user" => Ok(Self::Representative),
            "dev" => Ok(Self::Champion),
            "ba" => Ok(Self::Approver),
            "pm" => Ok(Self::Executive),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// Decisión registrada por un rol al cerrar su etapa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses the raw decision signal posted by a stage view. Only the exact
    /// strings `approved` and `rejected` are accepted.
    pub fn parse_signal(signal: Option<&str>) -> Result<Self, DomainError> {
        match signal {
            Some("approved") => Ok(Self::Approved),
            Some("rejected") => Ok(Self::Rejected),
            other => Err(DomainError::InvalidDecision(other.map(str::to_string))),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Decision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_signal(Some(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_codes_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_code(role.code()).unwrap(), role);
        }
        assert!(Role::from_code("admin").is_err());
    }

    #[test]
    fn decision_signal_is_exact() {
        assert_eq!(Decision::parse_signal(Some("approved")).unwrap(), Decision::Approved);
        assert_eq!(Decision::parse_signal(Some("rejected")).unwrap(), Decision::Rejected);
        assert!(Decision::parse_signal(Some("Approved")).is_err());
        assert!(Decision::parse_signal(Some("maybe")).is_err());
        assert!(Decision::parse_signal(None).is_err());
    }
}
