/// Property-based tests using proptest
/// Tests invariants that should hold for every lead and retry schedule
use proptest::prelude::*;
use rust_lead_score::models::{Industry, Lead, PriorityLevel};
use rust_lead_score::notifier::high_priority;
use rust_lead_score::retry::BackoffPolicy;
use rust_lead_score::scoring::{score, MAX_SCORE};

fn picklist(values: &'static [&'static str]) -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        proptest::sample::select(values).prop_map(|v| Some(v.to_string())),
        "\\PC{0,20}".prop_map(Some),
    ]
}

fn arb_lead() -> impl Strategy<Value = Lead> {
    (
        picklist(&["High", "Medium", "Low"]),
        picklist(&["Large Enterprise", "Small/Medium Enterprise", "Retail"]),
        proptest::option::of(-1000i64..1000),
    )
        .prop_map(|(priority, industry, existing)| {
            let mut lead = Lead::new("1");
            lead.priority_level = priority.map(PriorityLevel::from);
            lead.industry = industry.map(Industry::from);
            lead.user_score = existing;
            lead
        })
}

// Property: scores only take values from the component table
proptest! {
    #[test]
    fn score_is_a_sum_of_table_components(lead in arb_lead()) {
        let s = score(&lead);
        let valid: Vec<i64> = [60, 30, 10]
            .iter()
            .flat_map(|p| [50, 20, 0].iter().map(move |i| p + i))
            .collect();
        prop_assert!(valid.contains(&s));
        prop_assert!((0..=MAX_SCORE).contains(&s));
    }

    #[test]
    fn score_is_deterministic_and_pure(lead in arb_lead()) {
        let before = lead.clone();
        prop_assert_eq!(score(&lead), score(&lead));
        prop_assert_eq!(lead, before);
    }
}

// Property: backoff never exceeds its cap and never shrinks
proptest! {
    #[test]
    fn backoff_is_monotonic_and_capped(
        base in 1u64..5_000,
        extra in 0u64..100_000,
        attempt in 0u32..200
    ) {
        let policy = BackoffPolicy { max_retries: 5, base_delay_ms: base, max_delay_ms: base + extra };
        let current = policy.delay_ms(attempt);
        prop_assert!(current <= policy.max_delay_ms);
        prop_assert!(current >= base);
        prop_assert!(policy.delay_ms(attempt + 1) >= current);
    }
}

// Property: the digest selection is an order-preserving filter
proptest! {
    #[test]
    fn high_priority_preserves_order(scores in proptest::collection::vec(0i64..=110, 0..50)) {
        let leads: Vec<Lead> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut lead = Lead::new(i.to_string());
                lead.user_score = Some(*s);
                lead
            })
            .collect();

        let selected = high_priority(&leads, 80);
        let expected: Vec<String> = leads
            .iter()
            .filter(|l| l.user_score.unwrap_or(0) > 80)
            .map(|l| l.id.clone())
            .collect();
        let actual: Vec<String> = selected.iter().map(|l| l.id.clone()).collect();

        prop_assert_eq!(actual, expected);
    }
}
