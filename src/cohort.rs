//! Cohort builder: threshold filtering, message-keyed grouping, and
//! top-N ranking over a scored user set.
//!
//! Cohorts are derived values, rebuilt from the current user set whenever
//! they are needed, and never persisted.

use std::collections::HashMap;

use crate::models::ScoredUser;

/// A group of users sharing the exact same recommendation message.
#[derive(Debug, Clone)]
pub struct Cohort {
    pub key: String,
    pub members: Vec<ScoredUser>,
}

/// Rough campaign theme derived from the recommendation text, for labels
/// in CLI output and reports. The substring match is a display heuristic,
/// not an authoritative taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignCategory {
    TeamExpansion,
    LimitRelief,
    Engagement,
    General,
}

impl CampaignCategory {
    pub fn classify(message: &str) -> CampaignCategory {
        let lower = message.to_lowercase();
        if lower.contains("team") {
            CampaignCategory::TeamExpansion
        } else if lower.contains("limit") {
            CampaignCategory::LimitRelief
        } else if lower.contains("activ") {
            CampaignCategory::Engagement
        } else {
            CampaignCategory::General
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CampaignCategory::TeamExpansion => "team expansion",
            CampaignCategory::LimitRelief => "limit relief",
            CampaignCategory::Engagement => "engagement",
            CampaignCategory::General => "general",
        }
    }
}

/// Users at or above the minimum propensity, in their original order.
pub fn filter_by_threshold(users: &[ScoredUser], min_propensity: f64) -> Vec<ScoredUser> {
    users
        .iter()
        .filter(|user| user.propensity_score >= min_propensity)
        .cloned()
        .collect()
}

/// Group users by exact recommendation message. Cohorts appear in order of
/// their first member; members keep input order. No empty cohorts.
pub fn group_by_recommendation(users: &[ScoredUser]) -> Vec<Cohort> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut cohorts: Vec<Cohort> = Vec::new();

    for user in users {
        match index.get(user.recommendation.as_str()).copied() {
            Some(at) => cohorts[at].members.push(user.clone()),
            None => {
                index.insert(user.recommendation.as_str(), cohorts.len());
                cohorts.push(Cohort {
                    key: user.recommendation.clone(),
                    members: vec![user.clone()],
                });
            }
        }
    }

    cohorts
}

/// The n highest-scoring users. The sort is stable, so tied scores keep
/// their original relative order.
pub fn top_n(users: &[ScoredUser], n: usize) -> Vec<ScoredUser> {
    let mut ranked = users.to_vec();
    ranked.sort_by(|a, b| {
        b.propensity_score
            .partial_cmp(&a.propensity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}
