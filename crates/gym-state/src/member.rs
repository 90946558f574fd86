//! # Members
//!
//! A member is created once through registration and is never removed.
//! Soft deletion flips `is_deleted` exactly once; a deleted member can no
//! longer receive memberships or check in.

use chrono::{DateTime, Utc};
use gym_core::{Email, MemberId, Phone, ValidationError};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum length of a first or last name.
pub const MAX_NAME_LEN: usize = 100;

/// A registered member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Fail with `MemberDeleted` if the member has been soft-deleted.
    pub fn ensure_usable(&self) -> Result<(), DomainError> {
        if self.is_deleted {
            return Err(DomainError::MemberDeleted(self.id));
        }
        Ok(())
    }

    /// Mark the member deleted. Irreversible.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_usable()?;
        self.is_deleted = true;
        self.updated_at = now;
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Unvalidated registration input.
#[derive(Debug, Clone, Default)]
pub struct MemberRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl MemberRegistration {
    /// Validate every field and build the new member.
    ///
    /// All violations are collected before failing.
    pub fn into_member(self, now: DateTime<Utc>) -> Result<Member, ValidationError> {
        let mut errors = ValidationError::new();

        let first_name = self.first_name.trim().to_string();
        check_name(&mut errors, "firstName", &first_name);
        let last_name = self.last_name.trim().to_string();
        check_name(&mut errors, "lastName", &last_name);

        let email = Email::parse(&self.email)
            .map_err(|e| errors.push("email", e.to_string(), "invalid_string"))
            .ok();

        let phone = match self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(raw) => Phone::parse(raw)
                .map_err(|e| errors.push("phone", e.to_string(), "invalid_string"))
                .ok(),
            None => None,
        };

        errors.into_result()?;
        let email = email.ok_or_else(ValidationError::new)?;

        Ok(Member {
            id: MemberId::new(),
            first_name,
            last_name,
            email,
            phone,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        })
    }
}

fn check_name(errors: &mut ValidationError, field: &str, value: &str) {
    let len = value.chars().count();
    if len == 0 {
        errors.push(field, format!("{field} is required"), "too_small");
    } else if len > MAX_NAME_LEN {
        errors.push(
            field,
            format!("{field} must be at most {MAX_NAME_LEN} characters"),
            "too_big",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> MemberRegistration {
        MemberRegistration {
            first_name: "  Ada ".into(),
            last_name: "Lovelace".into(),
            email: "Ada@Example.com".into(),
            phone: Some("+44 20 7946 0018".into()),
        }
    }

    #[test]
    fn registration_normalizes_fields() {
        let now = Utc::now();
        let member = registration().into_member(now).unwrap();
        assert_eq!(member.first_name, "Ada");
        assert_eq!(member.email.as_str(), "ada@example.com");
        assert!(!member.is_deleted);
        assert_eq!(member.created_at, now);
        assert_eq!(member.full_name(), "Ada Lovelace");
    }

    #[test]
    fn registration_reports_every_bad_field() {
        let reg = MemberRegistration {
            first_name: "   ".into(),
            last_name: "x".repeat(101),
            email: "nope".into(),
            phone: Some("call me".into()),
        };
        let err = reg.into_member(Utc::now()).unwrap_err();
        let fields: Vec<_> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["firstName", "lastName", "email", "phone"]);
    }

    #[test]
    fn blank_phone_is_treated_as_absent() {
        let reg = MemberRegistration {
            phone: Some("  ".into()),
            ..registration()
        };
        assert!(reg.into_member(Utc::now()).unwrap().phone.is_none());
    }

    #[test]
    fn soft_delete_flips_once() {
        let mut member = registration().into_member(Utc::now()).unwrap();
        member.soft_delete(Utc::now()).unwrap();
        assert!(member.is_deleted);
        assert_eq!(
            member.soft_delete(Utc::now()),
            Err(DomainError::MemberDeleted(member.id))
        );
        assert!(member.ensure_usable().is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let member = registration().into_member(Utc::now()).unwrap();
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["isDeleted"], false);
        assert!(json.get("createdAt").is_some());
    }
}
