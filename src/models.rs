use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Plan {
    Free,
    Starter,
    Pro,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Starter, Plan::Pro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Starter => "Starter",
            Plan::Pro => "Pro",
        }
    }

    /// Lenient parse used by CSV import: unknown plans fall back to Free.
    pub fn parse_or_free(value: &str) -> Plan {
        match value.trim() {
            "Starter" => Plan::Starter,
            "Pro" => Plan::Pro,
            _ => Plan::Free,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's behavioral snapshot as ingested. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub signup_date: NaiveDate,
    pub plan: Plan,
    pub region: String,
    pub feature_usage_7d: u32,
    pub limit_hits_30d: u32,
    pub team_invites: u32,
    pub active_days_7d: u32,
    pub upgraded_in_30d: bool,
}

/// A feature record carried through the scoring stage.
///
/// `propensity_score` stays 0.0 and `recommendation` stays empty until the
/// scoring collaborator fills them in; a record whose scoring fails keeps
/// whatever values it already had.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredUser {
    #[serde(flatten)]
    pub record: FeatureRecord,
    pub propensity_score: f64,
    pub reason: Option<String>,
    pub recommendation: String,
}

impl ScoredUser {
    pub fn unscored(record: FeatureRecord) -> Self {
        Self {
            record,
            propensity_score: 0.0,
            reason: None,
            recommendation: String::new(),
        }
    }
}

/// Aggregate result of one campaign run. Reported to the caller, not stored.
#[derive(Debug, Clone)]
pub struct CampaignOutcome {
    pub cohort_key: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn sample_record(name: &str, plan: Plan) -> FeatureRecord {
        FeatureRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            signup_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            plan,
            region: "Germany".to_string(),
            feature_usage_7d: 40,
            limit_hits_30d: 1,
            team_invites: 3,
            active_days_7d: 4,
            upgraded_in_30d: false,
        }
    }

    pub fn scored(name: &str, score: f64, recommendation: &str) -> ScoredUser {
        ScoredUser {
            record: sample_record(name, Plan::Free),
            propensity_score: score,
            reason: None,
            recommendation: recommendation.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_parse_falls_back_to_free() {
        assert_eq!(Plan::parse_or_free("Pro"), Plan::Pro);
        assert_eq!(Plan::parse_or_free("Starter"), Plan::Starter);
        assert_eq!(Plan::parse_or_free("Enterprise"), Plan::Free);
        assert_eq!(Plan::parse_or_free(""), Plan::Free);
    }

    #[test]
    fn unscored_user_has_empty_score_fields() {
        let user = ScoredUser::unscored(test_support::sample_record("Avery Lee", Plan::Free));
        assert_eq!(user.propensity_score, 0.0);
        assert!(user.reason.is_none());
        assert!(user.recommendation.is_empty());
    }
}
