//! # Plans
//!
//! Catalog entries a membership is sold against. Only active plans may be
//! newly assigned; the plan duration drives end-date derivation.

use chrono::{DateTime, Utc};
use gym_core::{CalendarDate, PlanId, ValidationError};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub const MAX_PLAN_NAME_LEN: usize = 100;
pub const MAX_PLAN_DESCRIPTION_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i32,
    pub duration_days: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Fail with `PlanInactive` unless the plan may be newly assigned.
    pub fn ensure_assignable(&self) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::PlanInactive(self.id));
        }
        Ok(())
    }

    /// `start + duration_days`, in whole calendar days.
    pub fn end_date_from(&self, start: CalendarDate) -> Result<CalendarDate, DomainError> {
        let days = u32::try_from(self.duration_days).unwrap_or(0);
        let end = start.add_days(days).map_err(DomainError::DateOverflow)?;
        if end <= start {
            return Err(DomainError::InvalidWindow { start, end });
        }
        Ok(end)
    }
}

/// Unvalidated plan input, used by the catalog seeder.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i32,
    pub duration_days: i32,
    pub is_active: bool,
}

impl PlanDraft {
    pub fn into_plan(self, now: DateTime<Utc>) -> Result<Plan, ValidationError> {
        let mut errors = ValidationError::new();

        let name = self.name.trim().to_string();
        let name_len = name.chars().count();
        if name_len == 0 {
            errors.push("name", "name is required", "too_small");
        } else if name_len > MAX_PLAN_NAME_LEN {
            errors.push(
                "name",
                format!("name must be at most {MAX_PLAN_NAME_LEN} characters"),
                "too_big",
            );
        }
        if let Some(desc) = &self.description {
            if desc.chars().count() > MAX_PLAN_DESCRIPTION_LEN {
                errors.push(
                    "description",
                    format!("description must be at most {MAX_PLAN_DESCRIPTION_LEN} characters"),
                    "too_big",
                );
            }
        }
        if self.price_cents < 0 {
            errors.push("priceCents", "priceCents must be non-negative", "too_small");
        }
        if self.duration_days < 1 {
            errors.push("durationDays", "durationDays must be at least 1", "too_small");
        }
        errors.into_result()?;

        Ok(Plan {
            id: PlanId::new(),
            name,
            description: self.description,
            price_cents: self.price_cents,
            duration_days: self.duration_days,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        })
    }
}
