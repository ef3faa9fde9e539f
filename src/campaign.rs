//! Campaign dispatcher: sends a cohort's message to a bounded sample of its
//! members through the delivery webhook, one request at a time.
//!
//! Dispatch is deliberately sequential with a pause between sends; the gap
//! rate-limits the external channel. Any send failure is treated as the
//! channel being broken, so the remaining queue is abandoned rather than
//! retried (already-sent members stay sent).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cohort::Cohort;
use crate::models::{CampaignOutcome, Plan, ScoredUser};

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("delivery endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("delivery not configured: {0}")]
    NotConfigured(String),
}

/// Payload of one outreach request.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryRequest {
    pub name: String,
    pub email: String,
    pub message: String,
    pub plan: Plan,
}

impl DeliveryRequest {
    pub fn for_member(member: &ScoredUser, message: &str) -> Self {
        Self {
            name: member.record.name.clone(),
            email: member.record.email.clone(),
            message: message.to_string(),
            plan: member.record.plan,
        }
    }
}

/// The external channel outreach goes through.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError>;
}

/// JSON-POST webhook delivery. Any 2xx counts as delivered.
pub struct WebhookDelivery {
    http: reqwest::Client,
    url: String,
}

impl WebhookDelivery {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn from_env() -> Result<Self, DeliveryError> {
        let url = std::env::var("DELIVERY_WEBHOOK_URL").map_err(|_| {
            DeliveryError::NotConfigured("set DELIVERY_WEBHOOK_URL env var".into())
        })?;
        Ok(Self::new(url))
    }
}

#[async_trait]
impl DeliveryChannel for WebhookDelivery {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        let response = self.http.post(&self.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status));
        }
        Ok(())
    }
}

/// Fixed-interval gate between sequential sends. The interval is policy,
/// held here rather than inlined in the dispatch loops.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    interval: Duration,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Pacing and sampling knobs for dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Pause between members within one cohort campaign.
    pub member_interval: Duration,
    /// Pause between cohorts when sweeping all campaigns.
    pub cohort_interval: Duration,
    /// Most members contacted per cohort campaign.
    pub sample_cap: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            member_interval: Duration::from_millis(500),
            cohort_interval: Duration::from_millis(700),
            sample_cap: 2,
        }
    }
}

pub struct Dispatcher<'a> {
    channel: &'a dyn DeliveryChannel,
    config: DispatchConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(channel: &'a dyn DeliveryChannel, config: DispatchConfig) -> Self {
        Self { channel, config }
    }

    /// Send a cohort's message to at most `sample_cap` of its members.
    ///
    /// Sends are sequential with a pause after each. The first failure stops
    /// the run; members already contacted are not compensated.
    pub async fn run_cohort_campaign(
        &self,
        cohort_key: &str,
        members: &[ScoredUser],
        message: &str,
    ) -> CampaignOutcome {
        let selected = &members[..members.len().min(self.config.sample_cap)];
        let throttle = Throttle::new(self.config.member_interval);
        let mut outcome = CampaignOutcome {
            cohort_key: cohort_key.to_string(),
            attempted: 0,
            succeeded: 0,
            failed: 0,
        };

        for member in selected {
            outcome.attempted += 1;
            let request = DeliveryRequest::for_member(member, message);
            match self.channel.send(&request).await {
                Ok(()) => {
                    info!(cohort = cohort_key, email = %request.email, "outreach delivered");
                    outcome.succeeded += 1;
                }
                Err(err) => {
                    warn!(cohort = cohort_key, email = %request.email, error = %err,
                        "delivery failed, abandoning cohort campaign");
                    outcome.failed += 1;
                    return outcome;
                }
            }
            throttle.pause().await;
        }

        outcome
    }

    /// Send one representative (the first member) per cohort.
    ///
    /// A failed representative send aborts the sweep; cohorts not yet
    /// reached are skipped entirely.
    pub async fn run_all_campaigns(&self, cohorts: &[Cohort]) -> Vec<CampaignOutcome> {
        let throttle = Throttle::new(self.config.cohort_interval);
        let mut outcomes = Vec::new();

        for cohort in cohorts {
            let Some(representative) = cohort.members.first() else {
                continue;
            };
            let request = DeliveryRequest::for_member(representative, &cohort.key);
            let mut outcome = CampaignOutcome {
                cohort_key: cohort.key.clone(),
                attempted: 1,
                succeeded: 0,
                failed: 0,
            };

            match self.channel.send(&request).await {
                Ok(()) => {
                    info!(cohort = %cohort.key, email = %request.email, "representative outreach delivered");
                    outcome.succeeded = 1;
                    outcomes.push(outcome);
                }
                Err(err) => {
                    warn!(cohort = %cohort.key, error = %err, "delivery failed, aborting campaign sweep");
                    outcome.failed = 1;
                    outcomes.push(outcome);
                    return outcomes;
                }
            }
            throttle.pause().await;
        }

        outcomes
    }
}
