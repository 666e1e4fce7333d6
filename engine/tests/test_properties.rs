//! Property-based tests for sequencing, response rules and timing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use iat::catalog::Catalog;
use iat::constants::round_ms;
use iat::recorder::MemoryRecorder;
use iat::response_rules::correct_side;
use iat::session::{Session, Transition};
use iat::trial_generator::generate;
use iat::types::{Block, BlockSummary, Category, Side};

/// Strategy: a block.
fn block_strategy() -> impl Strategy<Value = Block> {
    prop::sample::select(Block::ALL.to_vec())
}

/// Strategy: a side.
fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Left), Just(Side::Right)]
}

fn session(block: Block, seed: u64) -> Session {
    Session::builder(Arc::new(Catalog::default()), Box::new(MemoryRecorder::new()))
        .seed(Some(seed))
        .start_block(block.ordinal().into())
        .build()
        .unwrap()
}

proptest! {
    // 1. Practice blocks contain only their category, all on one side
    #[test]
    fn practice_blocks_single_category(seed in any::<u64>()) {
        let catalog = Catalog::default();
        let mut rng = SmallRng::seed_from_u64(seed);
        for (block, category) in [
            (Block::PracticeHuman, Category::HumanConcept),
            (Block::PracticeAi, Category::AiConcept),
        ] {
            let trials = generate(block, &catalog, &mut rng);
            prop_assert_eq!(trials.len(), 10);
            let sides: HashSet<Side> = trials.iter().map(|t| t.correct_side()).collect();
            prop_assert_eq!(sides.len(), 1);
            for t in &trials {
                prop_assert_eq!(t.stimulus().category, category);
            }
        }
    }

    // 2. Combined blocks are a permutation of the whole catalog
    #[test]
    fn combined_blocks_cover_catalog(seed in any::<u64>()) {
        let catalog = Catalog::default();
        let mut rng = SmallRng::seed_from_u64(seed);
        for block in [Block::CombinedCongruent, Block::CombinedReversed] {
            let trials = generate(block, &catalog, &mut rng);
            prop_assert_eq!(trials.len(), 40);
            for c in Category::ALL {
                let n = trials.iter().filter(|t| t.stimulus().category == c).count();
                prop_assert_eq!(n, 10, "category {} count", c);
            }
            let words: HashSet<&str> = trials.iter().map(|t| t.stimulus().text.as_str()).collect();
            prop_assert_eq!(words.len(), 40);
            for c in Category::ALL {
                for s in catalog.stimuli(c) {
                    prop_assert!(words.contains(s.text.as_str()));
                }
            }
        }
    }

    // 3. Every generated trial's correct side matches the rule table
    #[test]
    fn trial_side_matches_rule_table(block in block_strategy(), seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        for t in generate(block, &Catalog::default(), &mut rng) {
            prop_assert_eq!(Some(t.correct_side()), correct_side(block, t.stimulus().category));
        }
    }

    // 4. Rounding to three decimals is idempotent
    #[test]
    fn rounding_idempotent(ms in 0.0f64..1.0e6) {
        let once = round_ms(ms);
        prop_assert_eq!(round_ms(once), once);
        prop_assert!((once - ms).abs() <= 0.0005 + 1e-9);
    }

    // 5. Reaction time is non-negative and equals response - onset
    #[test]
    fn reaction_time_from_onset(delay_us in 0u64..10_000_000, seed in any::<u64>()) {
        let mut s = session(Block::PracticeHuman, seed);
        let t0 = Instant::now();
        s.present(t0);
        let at = t0 + Duration::from_micros(delay_us);
        let Transition::Recorded(o) = s.submit_response(Side::Left, at) else {
            return Err(TestCaseError::fail("response not recorded"));
        };
        prop_assert!(o.reaction_time_ms >= 0.0);
        prop_assert!((o.reaction_time_ms - delay_us as f64 / 1000.0).abs() < 1e-6);
    }

    // 6. is_correct <=> side == correct_side, error_flag == 1 - is_correct
    #[test]
    fn correctness_follows_rule_table(
        block in block_strategy(),
        seed in any::<u64>(),
        sides in prop::collection::vec(side_strategy(), 40),
    ) {
        let mut s = session(block, seed);
        let mut t = Instant::now();
        let mut i = 0;
        while let Some(trial) = s.present(t).cloned() {
            t += Duration::from_millis(100);
            let side = sides[i % sides.len()];
            let Transition::Recorded(o) = s.submit_response(side, t) else {
                return Err(TestCaseError::fail("response not recorded"));
            };
            let expected = correct_side(block, trial.stimulus().category);
            prop_assert_eq!(o.is_correct, Some(side) == expected);
            prop_assert_eq!(o.error_flag, u8::from(!o.is_correct));
            i += 1;
        }
        prop_assert_eq!(i, s.trial_count());
    }

    // 7. Block summary counts errors and averages reaction times
    #[test]
    fn summary_matches_outcomes(
        block in block_strategy(),
        seed in any::<u64>(),
        delays in prop::collection::vec(0u64..2_000_000, 40),
        sides in prop::collection::vec(side_strategy(), 40),
    ) {
        let mut s = session(block, seed);
        let mut t = Instant::now();
        let mut recorded = Vec::new();
        let mut i = 0;
        while s.present(t).is_some() {
            let at = t + Duration::from_micros(delays[i]);
            if let Transition::Recorded(o) = s.submit_response(sides[i], at) {
                recorded.push(o);
            }
            t = at;
            i += 1;
        }
        let summary = s.summary().unwrap();
        let errors = recorded.iter().filter(|o| o.error_flag == 1).count() as u32;
        let mean = recorded.iter().map(|o| o.reaction_time_ms).sum::<f64>() / recorded.len() as f64;
        prop_assert_eq!(summary.total_errors, errors);
        prop_assert!((summary.mean_reaction_time_ms - mean).abs() < 1e-9);
    }
}

// 8. Empty block summary has a zero mean
#[test]
fn empty_summary_is_zero() {
    for block in Block::ALL {
        let s = BlockSummary::from_outcomes(block, &[]);
        assert_eq!(s.total_errors, 0);
        assert_eq!(s.mean_reaction_time_ms, 0.0);
    }
}
