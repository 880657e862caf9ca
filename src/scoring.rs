//! Lead scoring.
//!
//! `score = priority component + industry component`, always in `[0, 110]`.

use crate::models::{Industry, Lead, PriorityLevel};

pub const HIGH_PRIORITY_POINTS: i64 = 60;
pub const MEDIUM_PRIORITY_POINTS: i64 = 30;
pub const BASE_PRIORITY_POINTS: i64 = 10;

pub const LARGE_ENTERPRISE_POINTS: i64 = 50;
pub const SMALL_MEDIUM_ENTERPRISE_POINTS: i64 = 20;

pub const MAX_SCORE: i64 = HIGH_PRIORITY_POINTS + LARGE_ENTERPRISE_POINTS;

/// Points for the priority picklist. Low, unknown and unset all get the base.
pub fn priority_component(level: Option<&PriorityLevel>) -> i64 {
    match level {
        Some(PriorityLevel::High) => HIGH_PRIORITY_POINTS,
        Some(PriorityLevel::Medium) => MEDIUM_PRIORITY_POINTS,
        _ => BASE_PRIORITY_POINTS,
    }
}

pub fn industry_component(industry: Option<&Industry>) -> i64 {
    match industry {
        Some(Industry::LargeEnterprise) => LARGE_ENTERPRISE_POINTS,
        Some(Industry::SmallMediumEnterprise) => SMALL_MEDIUM_ENTERPRISE_POINTS,
        _ => 0,
    }
}

/// Computes the score of a lead from its categorical attributes.
pub fn score(lead: &Lead) -> i64 {
    priority_component(lead.priority_level.as_ref()) + industry_component(lead.industry.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(priority: Option<&str>, industry: Option<&str>) -> Lead {
        let mut lead = Lead::new("1");
        lead.priority_level = priority.map(|p| PriorityLevel::from(p.to_string()));
        lead.industry = industry.map(|i| Industry::from(i.to_string()));
        lead
    }

    #[test]
    fn test_score_table() {
        let cases = [
            (Some("High"), Some("Large Enterprise"), 110),
            (Some("High"), Some("Small/Medium Enterprise"), 80),
            (Some("High"), None, 60),
            (Some("Medium"), Some("Large Enterprise"), 80),
            (Some("Medium"), Some("Retail"), 30),
            (Some("Low"), Some("Small/Medium Enterprise"), 30),
            (Some("Critical"), Some("Large Enterprise"), 60),
            (None, Some("Large Enterprise"), 60),
            (None, None, 10),
        ];

        for (priority, industry, expected) in cases {
            assert_eq!(
                score(&lead(priority, industry)),
                expected,
                "priority={:?} industry={:?}",
                priority,
                industry
            );
        }
    }

    #[test]
    fn test_score_ignores_existing_score() {
        let mut l = lead(Some("Medium"), None);
        l.user_score = Some(999);
        assert_eq!(score(&l), 30);
        assert_eq!(l.user_score, Some(999));
    }

    #[test]
    fn test_picklist_values_are_case_sensitive() {
        assert_eq!(score(&lead(Some("high"), Some("large enterprise"))), 10);
    }
}
