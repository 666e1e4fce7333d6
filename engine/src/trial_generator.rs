//! Trial sequence generation.
//!
//! A block's sequence is every catalog stimulus of every eligible category,
//! each exactly once, in a uniformly random order. Each trial carries its
//! correct side, read from the same rule-table row that made the category
//! eligible.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Catalog;
use crate::response_rules::rule_table;
use crate::types::{Block, Trial};

/// Build and shuffle the trial sequence for `block`.
///
/// Uses a Fisher–Yates shuffle, so no position is biased toward any
/// category.
pub fn generate<R: Rng + ?Sized>(block: Block, catalog: &Catalog, rng: &mut R) -> Vec<Trial> {
    let mut trials: Vec<Trial> = rule_table(block)
        .iter()
        .flat_map(|&(category, side)| {
            catalog
                .stimuli(category)
                .iter()
                .map(move |s| Trial::new(s.clone(), block, side))
        })
        .collect();
    trials.shuffle(rng);
    trials
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    use crate::types::Category;

    #[test]
    fn test_practice_blocks_single_category() {
        let catalog = Catalog::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let b1 = generate(Block::PracticeHuman, &catalog, &mut rng);
        assert_eq!(b1.len(), 10);
        assert!(b1.iter().all(|t| t.stimulus().category == Category::HumanConcept));
        let b2 = generate(Block::PracticeAi, &catalog, &mut rng);
        assert_eq!(b2.len(), 10);
        assert!(b2.iter().all(|t| t.stimulus().category == Category::AiConcept));
    }

    #[test]
    fn test_combined_block_covers_catalog() {
        let catalog = Catalog::default();
        let mut rng = SmallRng::seed_from_u64(11);
        let trials = generate(Block::CombinedCongruent, &catalog, &mut rng);
        assert_eq!(trials.len(), 40);
        let words: HashSet<&str> = trials.iter().map(|t| t.stimulus().text.as_str()).collect();
        assert_eq!(words.len(), 40);
        for c in Category::ALL {
            for s in catalog.stimuli(c) {
                assert!(words.contains(s.text.as_str()), "missing {}", s.text);
            }
        }
    }

    #[test]
    fn test_order_varies_between_entries() {
        let catalog = Catalog::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let first = generate(Block::CombinedReversed, &catalog, &mut rng);
        // 40! orderings; a repeat across ten draws would indicate no shuffle.
        let differs =
            (0..10).any(|_| generate(Block::CombinedReversed, &catalog, &mut rng) != first);
        assert!(differs);
    }

    #[test]
    fn test_trials_tagged_with_block() {
        let catalog = Catalog::default();
        let mut rng = SmallRng::seed_from_u64(5);
        for block in Block::ALL {
            assert!(generate(block, &catalog, &mut rng)
                .iter()
                .all(|t| t.block() == block));
        }
    }
}
