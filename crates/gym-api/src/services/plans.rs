//! Plan catalog reads and seeding.

use chrono::{DateTime, Utc};
use gym_core::{PageRequest, PlanId};
use gym_state::{DomainError, Plan, PlanDraft};

use crate::db::{Database, PlanFilter};
use crate::error::AppError;

pub async fn get(db: &Database, id: PlanId) -> Result<Plan, AppError> {
    Ok(db.get_plan(id).await?.ok_or(DomainError::PlanNotFound(id))?)
}

pub async fn list(
    db: &Database,
    filter: &PlanFilter,
    page: PageRequest,
) -> Result<(Vec<Plan>, u64), AppError> {
    Ok(db.list_plans(filter, page).await?)
}

/// Plans offered by a freshly provisioned gym.
pub fn default_catalog() -> Vec<PlanDraft> {
    let draft = |name: &str, description: &str, price_cents, duration_days| PlanDraft {
        name: name.to_string(),
        description: Some(description.to_string()),
        price_cents,
        duration_days,
        is_active: true,
    };
    vec![
        draft("Day Pass", "Single-day access to all facilities", 1500, 1),
        draft("Monthly", "30 days of unlimited access", 4999, 30),
        draft("Quarterly", "90 days of unlimited access", 13499, 90),
        draft("Annual", "365 days of unlimited access with two guest passes", 47999, 365),
        PlanDraft {
            is_active: false,
            ..draft(
                "Founders Annual",
                "Discontinued launch offer, kept for existing members",
                29999,
                365,
            )
        },
    ]
}

/// Outcome of [`seed_catalog`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
}

/// Insert each draft whose name is not taken yet. With `dry_run`, only
/// report what would be inserted.
pub async fn seed_catalog(
    db: &Database,
    drafts: Vec<PlanDraft>,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();
    for draft in drafts {
        let plan = draft.into_plan(now)?;
        if db.find_plan_by_name(&plan.name).await?.is_some() {
            tracing::debug!(plan = %plan.name, "plan exists, skipping");
            report.skipped.push(plan.name);
            continue;
        }
        if !dry_run {
            db.insert_plan(&plan).await?;
            tracing::info!(plan_id = %plan.id, plan = %plan.name, "plan seeded");
        }
        report.inserted.push(plan.name);
    }
    Ok(report)
}
