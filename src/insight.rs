//! Insight extractor: contrasts users who upgraded against those who did
//! not and asks the model for the single biggest behavioral difference.
//!
//! No local inference happens here; the module only shapes the two groups
//! and relays the collaborator's sentence.

use serde_json::json;

use crate::llm::{ModelError, TextModel};
use crate::models::ScoredUser;

/// Most users serialized per group, to bound the prompt size.
pub const GROUP_CAP: usize = 10;

/// Split the set on the upgrade flag, each side capped at [`GROUP_CAP`].
pub fn partition_by_upgrade(users: &[ScoredUser]) -> (Vec<&ScoredUser>, Vec<&ScoredUser>) {
    let upgraded: Vec<&ScoredUser> = users
        .iter()
        .filter(|u| u.record.upgraded_in_30d)
        .take(GROUP_CAP)
        .collect();
    let not_upgraded: Vec<&ScoredUser> = users
        .iter()
        .filter(|u| !u.record.upgraded_in_30d)
        .take(GROUP_CAP)
        .collect();
    (upgraded, not_upgraded)
}

fn insight_prompt(upgraded: &[&ScoredUser], not_upgraded: &[&ScoredUser]) -> String {
    format!(
        "You are a world-class Product Analyst. I have two groups of SaaS users.\n\
         GROUP A (Upgraded): {}\n\
         GROUP B (Did Not Upgrade): {}\n\n\
         Analyze their behaviors. What is the single biggest difference or pattern \
         in GROUP A that is not in GROUP B?\n\
         Describe this insight in one single sentence, like you're telling a CEO.\n\
         For example: \"Users who invite more than 4 teammates are far more likely to upgrade.\"",
        json!(upgraded),
        json!(not_upgraded)
    )
}

/// Ask the model for a one-sentence differentiator between the two groups.
/// The sentence is returned verbatim; any failure surfaces as one error.
pub async fn discover_insight(
    model: &dyn TextModel,
    users: &[ScoredUser],
) -> Result<String, ModelError> {
    let (upgraded, not_upgraded) = partition_by_upgrade(users);
    model.generate(&insight_prompt(&upgraded, &not_upgraded)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_record;
    use crate::models::{Plan, ScoredUser};

    fn user(upgraded: bool) -> ScoredUser {
        let mut record = sample_record("Sample User", Plan::Free);
        record.upgraded_in_30d = upgraded;
        ScoredUser::unscored(record)
    }

    #[test]
    fn partition_splits_on_the_flag() {
        let users = vec![user(true), user(false), user(true)];
        let (upgraded, not_upgraded) = partition_by_upgrade(&users);
        assert_eq!(upgraded.len(), 2);
        assert_eq!(not_upgraded.len(), 1);
    }

    #[test]
    fn partition_caps_each_group_at_ten() {
        let mut users: Vec<ScoredUser> = (0..15).map(|_| user(true)).collect();
        users.extend((0..12).map(|_| user(false)));

        let (upgraded, not_upgraded) = partition_by_upgrade(&users);

        assert_eq!(upgraded.len(), GROUP_CAP);
        assert_eq!(not_upgraded.len(), GROUP_CAP);
    }

    #[test]
    fn empty_partitions_serialize_as_empty_lists() {
        let users = vec![user(true)];
        let (upgraded, not_upgraded) = partition_by_upgrade(&users);
        let prompt = insight_prompt(&upgraded, &not_upgraded);
        assert!(prompt.contains("GROUP B (Did Not Upgrade): []"));
    }
}
