use std::fmt::Write;

use crate::cohort;
use crate::models::{Plan, ScoredUser};

const MRR_PER_UPGRADE: u64 = 49;

/// Fixed model weights shown in the report; which behaviors matter most
/// for upgrade propensity.
const FEATURE_IMPORTANCE: [(&str, f64); 4] = [
    ("Active Days (7d)", 0.30),
    ("Limit Hits (30d)", 0.25),
    ("Team Invites", 0.25),
    ("Feature Usage (7d)", 0.20),
];

#[derive(Debug, Clone, Copy, Default)]
struct PlanMetrics {
    count: usize,
    active_days: u64,
    feature_usage: u64,
    limit_hits: u64,
    team_invites: u64,
}

impl PlanMetrics {
    fn avg(total: u64, count: usize) -> f64 {
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }
}

fn metrics_by_plan(users: &[ScoredUser]) -> Vec<(Plan, PlanMetrics)> {
    let mut by_plan: Vec<(Plan, PlanMetrics)> = Plan::ALL
        .iter()
        .map(|plan| (*plan, PlanMetrics::default()))
        .collect();

    for user in users {
        let record = &user.record;
        if let Some((_, metrics)) = by_plan.iter_mut().find(|(plan, _)| *plan == record.plan) {
            metrics.count += 1;
            metrics.active_days += u64::from(record.active_days_7d);
            metrics.feature_usage += u64::from(record.feature_usage_7d);
            metrics.limit_hits += u64::from(record.limit_hits_30d);
            metrics.team_invites += u64::from(record.team_invites);
        }
    }

    by_plan
}

fn propensity_buckets(users: &[ScoredUser]) -> [(String, usize); 5] {
    let mut buckets = [
        ("0.0-0.2".to_string(), 0),
        ("0.2-0.4".to_string(), 0),
        ("0.4-0.6".to_string(), 0),
        ("0.6-0.8".to_string(), 0),
        ("0.8-1.0".to_string(), 0),
    ];

    for user in users {
        let index = ((user.propensity_score / 0.2) as usize).min(4);
        buckets[index].1 += 1;
    }

    buckets
}

pub fn build_report(users: &[ScoredUser], min_propensity: f64) -> String {
    let filtered = cohort::filter_by_threshold(users, min_propensity);
    let total = users.len();
    let likely = filtered.len();
    let percentage = if total == 0 {
        0.0
    } else {
        likely as f64 / total as f64 * 100.0
    };

    let mut output = String::new();
    let _ = writeln!(output, "# Upsell Pipeline Overview");
    let _ = writeln!(output);
    let _ = writeln!(output, "- Total users: {total}");
    let _ = writeln!(
        output,
        "- Likely to upgrade (score >= {min_propensity:.2}): {likely} ({percentage:.1}%)"
    );
    let _ = writeln!(
        output,
        "- Estimated MRR uplift: ${} (at ${MRR_PER_UPGRADE}/user/mo)",
        likely as u64 * MRR_PER_UPGRADE
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Users by Plan");
    let by_plan = metrics_by_plan(users);
    for (plan, metrics) in &by_plan {
        let _ = writeln!(output, "- {plan}: {} users", metrics.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Propensity Score Distribution");
    for (range, count) in propensity_buckets(users) {
        let _ = writeln!(output, "- {range}: {count} users");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Average Activity by Plan");
    for (plan, metrics) in &by_plan {
        let _ = writeln!(
            output,
            "- {plan}: {:.1} active days, {:.1}% feature usage, {:.1} limit hits, {:.1} invites",
            PlanMetrics::avg(metrics.active_days, metrics.count),
            PlanMetrics::avg(metrics.feature_usage, metrics.count),
            PlanMetrics::avg(metrics.limit_hits, metrics.count),
            PlanMetrics::avg(metrics.team_invites, metrics.count),
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Feature Importance");
    for (label, weight) in FEATURE_IMPORTANCE {
        let _ = writeln!(output, "- {label}: {:.0}%", weight * 100.0);
    }

    let top = cohort::top_n(&filtered, 10);
    if !top.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Top Upgrade Candidates");
        for user in &top {
            let _ = writeln!(
                output,
                "- {} ({}, {}) score {:.2}: {}",
                user.record.name,
                user.record.email,
                user.record.plan,
                user.propensity_score,
                if user.recommendation.is_empty() {
                    "no recommendation yet"
                } else {
                    user.recommendation.as_str()
                }
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::scored;

    #[test]
    fn report_counts_totals_and_filtered_share() {
        let users = vec![
            scored("One", 0.9, "Go Pro"),
            scored("Two", 0.3, "Stay put"),
            scored("Three", 0.7, "Go Pro"),
        ];

        let report = build_report(&users, 0.5);

        assert!(report.contains("Total users: 3"));
        assert!(report.contains("Likely to upgrade (score >= 0.50): 2 (66.7%)"));
        assert!(report.contains("Estimated MRR uplift: $98"));
    }

    #[test]
    fn buckets_cover_the_full_range() {
        let users = vec![
            scored("A", 0.0, ""),
            scored("B", 0.55, ""),
            scored("C", 1.0, ""),
        ];

        let report = build_report(&users, 0.0);

        assert!(report.contains("0.0-0.2: 1 users"));
        assert!(report.contains("0.4-0.6: 1 users"));
        assert!(report.contains("0.8-1.0: 1 users"));
    }

    #[test]
    fn empty_set_renders_without_division_errors() {
        let report = build_report(&[], 0.5);
        assert!(report.contains("Total users: 0"));
        assert!(report.contains("(0.0%)"));
    }

    #[test]
    fn top_candidates_listed_by_score() {
        let users = vec![
            scored("Second", 0.8, "B"),
            scored("First", 0.95, "A"),
        ];

        let report = build_report(&users, 0.5);
        let first_at = report.find("First").unwrap();
        let second_at = report.find("Second").unwrap();
        assert!(first_at < second_at);
    }
}
