//! CSV import/export for the pipeline's working set.
//!
//! Import is lenient per-field (bad numbers become 0, unknown plans become
//! Free) but strict per-file: an empty or structurally broken file rejects
//! the whole import so prior state is never half-replaced. Export writes
//! the import columns plus the scoring columns, so an exported file can be
//! re-imported (scores reset to 0 on the way back in).

use std::path::Path;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{FeatureRecord, Plan, ScoredUser};

/// Import column order. Extra trailing columns (e.g. from an export) are
/// ignored.
const IMPORT_COLUMNS: usize = 10;

const EXPORT_HEADER: [&str; 13] = [
    "name",
    "email",
    "signupDate",
    "currentPlan",
    "region",
    "featureUsage7d",
    "limitHits30d",
    "teamInvites",
    "activeDays7d",
    "upgradedIn30d",
    "propensityScore",
    "reason",
    "recommendation",
];

fn field<'r>(row: &'r csv::StringRecord, index: usize) -> &'r str {
    row.get(index).unwrap_or("").trim()
}

fn parse_count(value: &str) -> u32 {
    value.parse().unwrap_or(0)
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

fn parse_date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

/// Read feature records from a CSV file. The header row is discarded and
/// columns are taken by position. Each row gets a fresh id.
pub fn import_records(path: &Path) -> anyhow::Result<Vec<FeatureRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("failed to read CSV row {}", line + 2))?;
        if row.len() < IMPORT_COLUMNS {
            bail!(
                "row {} has {} columns, expected at least {IMPORT_COLUMNS}",
                line + 2,
                row.len()
            );
        }

        records.push(FeatureRecord {
            id: Uuid::new_v4(),
            name: field(&row, 0).to_string(),
            email: field(&row, 1).to_string(),
            signup_date: parse_date(field(&row, 2)),
            plan: Plan::parse_or_free(field(&row, 3)),
            region: field(&row, 4).to_string(),
            feature_usage_7d: parse_count(field(&row, 5)),
            limit_hits_30d: parse_count(field(&row, 6)),
            team_invites: parse_count(field(&row, 7)),
            active_days_7d: parse_count(field(&row, 8)),
            upgraded_in_30d: parse_flag(field(&row, 9)),
        });
    }

    if records.is_empty() {
        bail!("CSV {} contains no data rows", path.display());
    }
    Ok(records)
}

/// Write the filtered set, every value quoted, one row per user.
pub fn export_users(path: &Path, users: &[ScoredUser]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(EXPORT_HEADER)?;
    for user in users {
        let record = &user.record;
        writer.write_record([
            record.name.as_str(),
            record.email.as_str(),
            &record.signup_date.format("%Y-%m-%d").to_string(),
            record.plan.as_str(),
            record.region.as_str(),
            &record.feature_usage_7d.to_string(),
            &record.limit_hits_30d.to_string(),
            &record.team_invites.to_string(),
            &record.active_days_7d.to_string(),
            if record.upgraded_in_30d { "true" } else { "false" },
            &format!("{:.2}", user.propensity_score),
            user.reason.as_deref().unwrap_or(""),
            user.recommendation.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Default export filename, suffixed with today's date.
pub fn default_export_filename() -> String {
    format!(
        "upsell-recommendations-{}.csv",
        Utc::now().date_naive().format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_record;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn import_reads_fixed_column_order() {
        let file = write_temp(
            "name,email,signupDate,currentPlan,region,featureUsage7d,limitHits30d,teamInvites,activeDays7d,upgradedIn30d\n\
             Avery Lee,avery@example.com,2024-06-01,Pro,Brazil,55,2,8,6,true\n",
        );

        let records = import_records(file.path()).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Avery Lee");
        assert_eq!(record.plan, Plan::Pro);
        assert_eq!(record.region, "Brazil");
        assert_eq!(record.feature_usage_7d, 55);
        assert_eq!(record.active_days_7d, 6);
        assert!(record.upgraded_in_30d);
    }

    #[test]
    fn import_defaults_bad_numbers_and_plans() {
        let file = write_temp(
            "header\n\
             Jules Moreno,jules@example.com,2024-06-01,Platinum,France,lots,x,,3,yes\n",
        );

        let records = import_records(file.path()).unwrap();
        let record = &records[0];

        assert_eq!(record.plan, Plan::Free);
        assert_eq!(record.feature_usage_7d, 0);
        assert_eq!(record.limit_hits_30d, 0);
        assert_eq!(record.team_invites, 0);
        assert_eq!(record.active_days_7d, 3);
        assert!(!record.upgraded_in_30d);
    }

    #[test]
    fn import_rejects_empty_file() {
        let file = write_temp("name,email\n");
        assert!(import_records(file.path()).is_err());
    }

    #[test]
    fn import_rejects_short_rows() {
        let file = write_temp("header\nonly,three,columns\n");
        assert!(import_records(file.path()).is_err());
    }

    #[test]
    fn export_then_import_round_trips_record_fields() {
        let mut record = sample_record("Kiara Patel", Plan::Starter);
        record.feature_usage_7d = 77;
        record.team_invites = 14;
        let mut user = ScoredUser::unscored(record);
        user.propensity_score = 0.91;
        user.recommendation = "Invite your team, unlock more".to_string();

        let second = ScoredUser::unscored(sample_record("Jules Moreno", Plan::Pro));

        let file = tempfile::NamedTempFile::new().unwrap();
        export_users(file.path(), &[user.clone(), second.clone()]).unwrap();
        let reimported = import_records(file.path()).unwrap();

        assert_eq!(reimported.len(), 2);
        assert_eq!(reimported[0].name, "Kiara Patel");
        assert_eq!(reimported[0].plan, Plan::Starter);
        assert_eq!(reimported[0].feature_usage_7d, 77);
        assert_eq!(reimported[0].team_invites, 14);
        assert_eq!(reimported[1].name, "Jules Moreno");
        assert_eq!(reimported[1].plan, Plan::Pro);
        // Scoring fields do not survive the trip.
        assert_eq!(ScoredUser::unscored(reimported[0].clone()).propensity_score, 0.0);
    }

    #[test]
    fn export_quotes_every_value() {
        let user = ScoredUser::unscored(sample_record("Avery Lee", Plan::Free));
        let file = tempfile::NamedTempFile::new().unwrap();
        export_users(file.path(), &[user]).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let data_line = content.lines().nth(1).unwrap();
        assert!(data_line.starts_with("\"Avery Lee\",\"avery.lee@example.com\""));
    }

    #[test]
    fn default_filename_carries_the_date() {
        let name = default_export_filename();
        assert!(name.starts_with("upsell-recommendations-"));
        assert!(name.ends_with(".csv"));
    }
}
