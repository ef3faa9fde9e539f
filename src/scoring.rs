//! Scoring adapter: turns a batch of feature records into scored users by
//! asking the text-generation collaborator for a propensity score and an
//! upsell message per record.
//!
//! The batch contract is strict: same length, same order, and a record
//! whose scoring fails passes through untouched rather than being dropped.

use futures_util::future::join_all;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::llm::TextModel;
use crate::models::{FeatureRecord, ScoredUser};

/// Structured payload the model is asked to embed in its reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringPayload {
    pub propensity_score: f64,
    pub reason: Option<String>,
    pub recommendation_message: String,
}

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("no parseable JSON payload in model reply")]
    Unparseable,
}

/// Pull the structured payload out of a model reply.
///
/// The reply is expected to fence the JSON in a ```json block; some models
/// return bare JSON instead, so the whole text is tried as a fallback.
pub fn extract_payload(text: &str) -> Result<ScoringPayload, PayloadError> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            if let Ok(payload) = serde_json::from_str(rest[..end].trim()) {
                return Ok(payload);
            }
        }
    }
    serde_json::from_str(text.trim()).map_err(|_| PayloadError::Unparseable)
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}

fn scoring_prompt(record: &FeatureRecord) -> String {
    format!(
        "Analyze this SaaS user and generate a propensity score (0.0 to 1.0), \
         a short reason for the score, and a personalized upsell message.\n\
         The user data is:\n\
         - Current Plan: {}\n\
         - Team Invites (last 30d): {}\n\
         - Feature Limit Hits (last 30d): {}\n\
         - Active Days (last 7d): {}\n\n\
         Respond ONLY with a valid JSON object wrapped in markdown like this:\n\
         ```json\n\
         {{\"propensityScore\": 0.85, \"reason\": \"High team invites and recent activity.\", \
         \"recommendationMessage\": \"Your team is growing fast! Unlock collaboration tools \
         with the Team plan.\"}}\n\
         ```",
        record.plan, record.team_invites, record.limit_hits_30d, record.active_days_7d
    )
}

/// Score one record, falling back to the unscored input on any failure.
async fn score_record(model: &dyn TextModel, user: ScoredUser) -> ScoredUser {
    let reply = match model.generate(&scoring_prompt(&user.record)).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(user_id = %user.record.id, error = %err, "scoring request failed, passing record through");
            return user;
        }
    };

    match extract_payload(&reply) {
        Ok(payload) => ScoredUser {
            propensity_score: clamp_score(payload.propensity_score),
            reason: payload.reason,
            recommendation: payload.recommendation_message,
            record: user.record,
        },
        Err(_) => {
            warn!(user_id = %user.record.id, "model reply had no usable payload, passing record through");
            user
        }
    }
}

/// Score every record in the batch concurrently; output order matches input.
pub async fn score_batch(model: &dyn TextModel, records: Vec<FeatureRecord>) -> Vec<ScoredUser> {
    let futures = records
        .into_iter()
        .map(|record| score_record(model, ScoredUser::unscored(record)));
    join_all(futures).await
}
