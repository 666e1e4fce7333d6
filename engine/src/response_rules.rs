//! Response rules: which side is correct for each (block, category).
//!
//! | Block | Human | AI | Trust | Untrust |
//! |-------|-------|----|-------|---------|
//! | 1 | Left | — | — | — |
//! | 2 | — | Right | — | — |
//! | 3 | Left | Right | Left | Right |
//! | 4 | Right | Left | Left | Right |
//!
//! Block 3 pairs Human with Trust and AI with Untrust. Block 4 swaps only the
//! concept sides; the attribute sides are the same as in block 3.
//!
//! [`rule_table`] is the single source of truth for both eligibility and
//! mapping. The trial generator builds trials from its rows, and the side
//! labels are derived from it too.

use crate::catalog::Catalog;
use crate::constants::INSTRUCTION_EXAMPLES;
use crate::types::{Block, Category, Side};

const PRACTICE_HUMAN: &[(Category, Side)] = &[(Category::HumanConcept, Side::Left)];

const PRACTICE_AI: &[(Category, Side)] = &[(Category::AiConcept, Side::Right)];

const COMBINED_CONGRUENT: &[(Category, Side)] = &[
    (Category::HumanConcept, Side::Left),
    (Category::AiConcept, Side::Right),
    (Category::TrustAttribute, Side::Left),
    (Category::UntrustAttribute, Side::Right),
];

const COMBINED_REVERSED: &[(Category, Side)] = &[
    (Category::HumanConcept, Side::Right),
    (Category::AiConcept, Side::Left),
    (Category::TrustAttribute, Side::Left),
    (Category::UntrustAttribute, Side::Right),
];

/// Eligible categories of a block and the correct side for each.
pub fn rule_table(block: Block) -> &'static [(Category, Side)] {
    match block {
        Block::PracticeHuman => PRACTICE_HUMAN,
        Block::PracticeAi => PRACTICE_AI,
        Block::CombinedCongruent => COMBINED_CONGRUENT,
        Block::CombinedReversed => COMBINED_REVERSED,
    }
}

/// Correct side for a category in a block, or `None` if the category is not
/// presented in that block.
pub fn correct_side(block: Block, category: Category) -> Option<Side> {
    rule_table(block)
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, side)| *side)
}

/// On-screen labels `(left, right)`, joined from the category names mapped to
/// each side (concepts first). A side with no category gets an empty label.
pub fn side_labels(block: Block) -> (String, String) {
    let label = |side: Side| {
        rule_table(block)
            .iter()
            .filter(|(_, s)| *s == side)
            .map(|(c, _)| c.display_name())
            .collect::<Vec<_>>()
            .join(" o ")
    };
    (label(Side::Left), label(Side::Right))
}

/// Participant instructions for a block, naming the bound keys.
///
/// Practice blocks list the first few words of their category as examples.
/// The reversed block spells out the new concept keys and that the attribute
/// keys did not move.
pub fn instructions(block: Block, catalog: &Catalog, left_key: &str, right_key: &str) -> String {
    let left_key = left_key.to_uppercase();
    let right_key = right_key.to_uppercase();
    let key = |side: Side| match side {
        Side::Left => left_key.as_str(),
        Side::Right => right_key.as_str(),
    };

    match block {
        Block::PracticeHuman | Block::PracticeAi => rule_table(block)
            .iter()
            .map(|&(category, side)| {
                let examples: Vec<&str> = catalog
                    .stimuli(category)
                    .iter()
                    .take(INSTRUCTION_EXAMPLES)
                    .map(|s| s.text.as_str())
                    .collect();
                format!(
                    "Presiona {} cuando veas palabras que representen a {}. Ejemplos: {}, etc.",
                    key(side),
                    category.display_name(),
                    examples.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join(" "),
        Block::CombinedCongruent => {
            let (left, right) = side_labels(block);
            format!(
                "Presiona {left_key} si la palabra representa a {left}. \
                 Presiona {right_key} si la palabra representa a {right}."
            )
        }
        Block::CombinedReversed => {
            let keys_for = |categories: [Category; 2], sep: &str| {
                categories
                    .into_iter()
                    .filter_map(|c| correct_side(block, c).map(|s| (c, s)))
                    .map(|(c, s)| format!("{}{sep}{}", c.display_name(), key(s)))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "Ahora la asignación de categorías se invierte: {}. \
                 Las asignaciones para los atributos se mantienen: {}. \
                 Presiona la tecla correspondiente según el origen de la palabra.",
                keys_for(
                    [Category::HumanConcept, Category::AiConcept],
                    " se clasifica con la tecla "
                ),
                keys_for(
                    [Category::TrustAttribute, Category::UntrustAttribute],
                    " → "
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_cells() {
        use Category::*;
        use Side::*;

        let expected = [
            (Block::PracticeHuman, [Some(Left), None, None, None]),
            (Block::PracticeAi, [None, Some(Right), None, None]),
            (
                Block::CombinedCongruent,
                [Some(Left), Some(Right), Some(Left), Some(Right)],
            ),
            (
                Block::CombinedReversed,
                [Some(Right), Some(Left), Some(Left), Some(Right)],
            ),
        ];
        for (block, sides) in expected {
            for (cat, side) in [HumanConcept, AiConcept, TrustAttribute, UntrustAttribute]
                .into_iter()
                .zip(sides)
            {
                assert_eq!(correct_side(block, cat), side, "block={block} cat={cat}");
            }
        }
    }

    #[test]
    fn test_reversal_swaps_concepts_only() {
        for cat in [Category::HumanConcept, Category::AiConcept] {
            assert_eq!(
                correct_side(Block::CombinedReversed, cat),
                correct_side(Block::CombinedCongruent, cat).map(|s| match s {
                    Side::Left => Side::Right,
                    Side::Right => Side::Left,
                })
            );
        }
        for cat in [Category::TrustAttribute, Category::UntrustAttribute] {
            assert_eq!(
                correct_side(Block::CombinedReversed, cat),
                correct_side(Block::CombinedCongruent, cat)
            );
        }
    }

    #[test]
    fn test_side_labels() {
        assert_eq!(
            side_labels(Block::PracticeHuman),
            ("Seres Humanos".to_string(), String::new())
        );
        assert_eq!(
            side_labels(Block::PracticeAi),
            (String::new(), "Inteligencia Artificial".to_string())
        );
        assert_eq!(
            side_labels(Block::CombinedCongruent),
            (
                "Seres Humanos o Confiable".to_string(),
                "Inteligencia Artificial o No Confiable".to_string()
            )
        );
        assert_eq!(
            side_labels(Block::CombinedReversed),
            (
                "Inteligencia Artificial o Confiable".to_string(),
                "Seres Humanos o No Confiable".to_string()
            )
        );
    }

    #[test]
    fn test_practice_instructions_list_examples() {
        let catalog = Catalog::default();
        assert_eq!(
            instructions(Block::PracticeHuman, &catalog, "e", "i"),
            "Presiona E cuando veas palabras que representen a Seres Humanos. \
             Ejemplos: Persona, Individuo, Humano, etc."
        );
        assert_eq!(
            instructions(Block::PracticeAi, &catalog, "e", "i"),
            "Presiona I cuando veas palabras que representen a Inteligencia Artificial. \
             Ejemplos: Robot, Algoritmo, Programa, etc."
        );
    }

    #[test]
    fn test_combined_instructions_name_keys() {
        let catalog = Catalog::default();
        let text = instructions(Block::CombinedCongruent, &catalog, "e", "i");
        assert!(text.contains("Presiona E si la palabra representa a Seres Humanos o Confiable."));
        assert!(text.ends_with("representa a Inteligencia Artificial o No Confiable."));
    }

    #[test]
    fn test_reversed_instructions_keep_attribute_keys() {
        let text = instructions(Block::CombinedReversed, &Catalog::default(), "a", "l");
        assert!(text.contains("Seres Humanos se clasifica con la tecla L"));
        assert!(text.contains("Inteligencia Artificial se clasifica con la tecla A"));
        assert!(text.contains("se mantienen: Confiable → A, No Confiable → L."));
    }
}
