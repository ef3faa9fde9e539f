//! Sample data synthesis: fabricates a plausible SaaS user population for
//! demos and pipeline dry runs.

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::models::{FeatureRecord, Plan};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jules", "Kiara", "Mateo", "Noor", "Sofia", "Liam", "Priya", "Hana", "Diego",
    "Ingrid", "Tomas", "Amara", "Felix", "Yuki", "Omar",
];

const LAST_NAMES: [&str; 16] = [
    "Lee", "Moreno", "Patel", "Silva", "Haddad", "Rossi", "Novak", "Iyer", "Sato", "Garcia",
    "Larsen", "Dvorak", "Okafor", "Brandt", "Tanaka", "Farouk",
];

const REGIONS: [&str; 10] = [
    "United States",
    "Germany",
    "Brazil",
    "India",
    "Japan",
    "France",
    "Canada",
    "Australia",
    "Nigeria",
    "Poland",
];

/// Generate `count` random feature records within the conventional ranges.
pub fn generate_records(count: usize) -> Vec<FeatureRecord> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();

    (0..count)
        .map(|_| {
            let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Avery");
            let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Lee");
            let signup_offset = rng.gen_range(0..730);

            FeatureRecord {
                id: Uuid::new_v4(),
                name: format!("{first} {last}"),
                email: format!(
                    "{}.{}{}@example.com",
                    first.to_lowercase(),
                    last.to_lowercase(),
                    rng.gen_range(1..1000)
                ),
                signup_date: today - Duration::days(signup_offset),
                plan: *Plan::ALL.choose(&mut rng).unwrap_or(&Plan::Free),
                region: REGIONS.choose(&mut rng).copied().unwrap_or("Germany").to_string(),
                feature_usage_7d: rng.gen_range(0..=100),
                limit_hits_30d: rng.gen_range(0..=5),
                team_invites: rng.gen_range(0..=20),
                active_days_7d: rng.gen_range(0..=7),
                upgraded_in_30d: rng.gen_bool(0.5),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_count_within_ranges() {
        let records = generate_records(50);
        assert_eq!(records.len(), 50);

        for record in &records {
            assert!(!record.name.is_empty());
            assert!(record.email.contains('@'));
            assert!(record.feature_usage_7d <= 100);
            assert!(record.limit_hits_30d <= 5);
            assert!(record.team_invites <= 20);
            assert!(record.active_days_7d <= 7);
        }
    }

    #[test]
    fn ids_are_unique() {
        let records = generate_records(100);
        let mut ids: Vec<_> = records.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }
}
