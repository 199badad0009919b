//! Integration tests exercising the full pipeline across module boundaries:
//! parse -> weigh -> select -> anti-cluster -> shuffle, plus review scheduling.

use std::collections::HashSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use revu_core::{
    AllocationOptions, Answer, Feedback, FeedbackEvent, FeedbackPolicy, Question, ReviewState,
    Strategy, allocate, arrange, longest_run, parse_candidates, schedule, update,
};

fn rng() -> SmallRng {
    SmallRng::seed_from_u64(42)
}

/// Two content items, one question per difficulty level each, 30s apiece.
fn two_content_pool() -> Vec<Question> {
    let mut pool = Vec::new();
    for content in ["lecture", "podcast"] {
        for level in 1..=5u8 {
            pool.push(Question::new(
                format!("{content}-{level}"),
                content,
                level,
                30,
                1.0,
            ));
        }
    }
    pool
}

#[test]
fn balanced_session_end_to_end() {
    let pool = two_content_pool();
    let options = AllocationOptions::new(6, 5);

    let plan = allocate(&pool, &options, &mut rng()).unwrap();

    assert_eq!(plan.len(), 6);
    assert_eq!(plan.total_seconds(), 180.0);
    assert!((plan.estimated_total_time_minutes - 3.0).abs() < 1e-10);
    assert_eq!(plan.difficulty_counts(), [1, 1, 2, 1, 1]);
    assert_eq!(plan.strategy, Strategy::Balanced);
    assert_eq!(plan.content_distribution.values().sum::<usize>(), 6);
}

#[test]
fn selected_questions_come_from_pool() {
    let pool = two_content_pool();
    let ids: HashSet<&str> = pool.iter().map(|q| q.id.as_str()).collect();
    let plan = allocate(&pool, &AllocationOptions::new(8, 10), &mut rng()).unwrap();
    for q in &plan.questions {
        assert!(ids.contains(q.id.as_str()), "unknown question {}", q.id);
    }
    let unique: HashSet<&str> = plan.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(unique.len(), plan.len(), "no question selected twice");
}

#[test]
fn priority_steers_selection() {
    let mut pool = two_content_pool();
    for q in pool.iter_mut().filter(|q| q.content_id == "podcast") {
        q.priority_score = 5.0;
    }
    let mut options = AllocationOptions::new(5, 60);
    options.balance_by_difficulty = false;
    let plan = allocate(&pool, &options, &mut rng()).unwrap();
    assert_eq!(plan.content_distribution.get("podcast"), Some(&5));
    assert_eq!(plan.content_distribution.get("lecture"), None);
}

#[test]
fn preference_concentrates_on_level() {
    let pool: Vec<Question> = (0..50)
        .map(|i| Question::new(format!("q{i}"), format!("c{}", i % 5), (i % 5 + 1) as u8, 20, 2.0))
        .collect();
    let mut options = AllocationOptions::new(10, 30);
    options.difficulty_preference = Some(2);
    let plan = allocate(&pool, &options, &mut rng()).unwrap();
    assert_eq!(plan.difficulty_counts()[1], 5);
}

#[test]
fn pre_shuffle_order_is_anti_clustered() {
    let mut pool = Vec::new();
    for i in 0..6 {
        pool.push(Question::new(format!("a{i}"), "a", 3, 30, 1.0).with_priority(1.0));
    }
    for i in 0..3 {
        pool.push(Question::new(format!("b{i}"), "b", 3, 30, 1.0));
    }
    let mut options = AllocationOptions::new(9, 30);
    options.balance_by_difficulty = false;

    let ordered = arrange(&pool, &options).unwrap();
    assert_eq!(ordered.len(), 9);
    assert!(longest_run(&ordered) <= 2);
}

#[test]
fn candidates_from_json() {
    let json = r#"[
        {"id": "q1", "contentId": "c1", "difficultyLevel": 3, "estimatedTimeSeconds": 45, "contentDurationHours": 0.5},
        {"id": "q2", "contentId": "c1", "difficultyLevel": 3, "estimatedTimeSeconds": 45, "contentDurationHours": 0.5},
        {"id": "q3", "contentId": "c2", "difficultyLevel": 2, "estimatedTimeSeconds": 45, "contentDurationHours": 1.5}
    ]"#;
    let pool = parse_candidates(json).unwrap();
    let plan = allocate(&pool, &AllocationOptions::new(10, 10), &mut rng()).unwrap();
    // targets for 10: [1, 2, 4, 2, 1] -> both level-3 and the level-2 question fit
    assert_eq!(plan.len(), 3);
}

#[test]
fn review_progression_over_sessions() {
    let policy = FeedbackPolicy::default();
    let event = |answer| FeedbackEvent {
        content_id: "lecture".into(),
        question_id: "lecture-3".into(),
        answer,
        response_time_seconds: Some(8.5),
    };

    let mut state = ReviewState::fresh();
    let mut now = 1_767_139_200;
    let mut intervals = Vec::new();
    for _ in 0..4 {
        let scheduled = schedule(&state, &event(Answer::Feedback(Feedback::GotIt)), &policy, now)
            .unwrap();
        intervals.push(scheduled.state.interval);
        now = scheduled.next_review_due_at;
        state = scheduled.state;
    }
    assert_eq!(intervals, vec![1, 6, 15, 38]);

    let lapsed = schedule(&state, &event(Answer::Feedback(Feedback::Revisit)), &policy, now)
        .unwrap();
    assert!(lapsed.state.ease_factor < state.ease_factor);
    assert_eq!(lapsed.state.repetitions, 5);
}

proptest! {
    #[test]
    fn allocation_invariants(
        cases in prop::collection::vec((0usize..4, 1u8..=5, 5u32..200, 0.0f64..3.0), 0..40),
        max_questions in 1usize..25,
        minutes in 1u32..30,
        balance in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let pool: Vec<Question> = cases
            .iter()
            .enumerate()
            .map(|(i, &(c, level, secs, priority))| {
                Question::new(format!("q{i}"), format!("c{c}"), level, secs, (c + 1) as f64)
                    .with_priority(priority)
            })
            .collect();
        let mut options = AllocationOptions::new(max_questions, minutes);
        options.balance_by_difficulty = balance;

        let plan = allocate(&pool, &options, &mut SmallRng::seed_from_u64(seed)).unwrap();

        prop_assert!(plan.len() <= max_questions);
        prop_assert!(plan.total_seconds() <= f64::from(minutes) * 60.0);
        prop_assert_eq!(plan.content_distribution.values().sum::<usize>(), plan.len());
        prop_assert_eq!(plan.difficulty_distribution.values().sum::<usize>(), plan.len());
    }

    #[test]
    fn ease_factor_floor_holds_for_any_sequence(qualities in prop::collection::vec(0u8..=5, 1..30)) {
        let mut state = ReviewState::fresh();
        for q in qualities {
            state = update(&state, q).unwrap();
            prop_assert!(state.ease_factor >= 1.3);
        }
    }
}
