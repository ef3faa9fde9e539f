//! Upsell agent pipeline: scores SaaS users for upgrade propensity through
//! an external text-generation collaborator, groups them into
//! message-keyed campaign cohorts, and dispatches throttled outreach per
//! cohort through a webhook delivery channel.

pub mod campaign;
pub mod cohort;
pub mod csv_io;
pub mod insight;
pub mod llm;
pub mod models;
pub mod report;
pub mod sample;
pub mod scoring;
