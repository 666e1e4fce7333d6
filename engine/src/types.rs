//! Core data model: categories, sides, blocks, trials and their outcomes.
//!
//! [`Trial`] can only be built inside the crate (by the trial generator), which
//! is how every trial is guaranteed to carry a correct side from the rule
//! table. [`TrialOutcome`] is the immutable per-trial record written to the
//! result log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{round_ms, BLOCK_COUNT};
use crate::error::ConfigError;

/// Semantic category of a stimulus word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "human")]
    HumanConcept,
    #[serde(rename = "ai")]
    AiConcept,
    #[serde(rename = "trust")]
    TrustAttribute,
    #[serde(rename = "untrust")]
    UntrustAttribute,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::HumanConcept,
        Category::AiConcept,
        Category::TrustAttribute,
        Category::UntrustAttribute,
    ];

    /// Short code used in the `tipo` column of the result log.
    pub fn code(self) -> &'static str {
        match self {
            Category::HumanConcept => "human",
            Category::AiConcept => "ai",
            Category::TrustAttribute => "trust",
            Category::UntrustAttribute => "untrust",
        }
    }

    /// Participant-facing category name.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::HumanConcept => "Seres Humanos",
            Category::AiConcept => "Inteligencia Artificial",
            Category::TrustAttribute => "Confiable",
            Category::UntrustAttribute => "No Confiable",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Response side. A label, not a physical key: adapters bind keys or buttons
/// to sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(alias = "left", alias = "LEFT")]
    Left,
    #[serde(alias = "right", alias = "RIGHT")]
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }

    /// Parse a side name, case-insensitively. Anything else is unrecognized
    /// input and yields `None`.
    pub fn parse(s: &str) -> Option<Side> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four ordinal test stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Block {
    PracticeHuman = 1,
    PracticeAi = 2,
    CombinedCongruent = 3,
    CombinedReversed = 4,
}

impl Block {
    pub const ALL: [Block; 4] = [
        Block::PracticeHuman,
        Block::PracticeAi,
        Block::CombinedCongruent,
        Block::CombinedReversed,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The following block, or `None` after the last one.
    pub fn next(self) -> Option<Block> {
        match self {
            Block::PracticeHuman => Some(Block::PracticeAi),
            Block::PracticeAi => Some(Block::CombinedCongruent),
            Block::CombinedCongruent => Some(Block::CombinedReversed),
            Block::CombinedReversed => None,
        }
    }

    pub fn is_final(self) -> bool {
        self.ordinal() == BLOCK_COUNT
    }

    pub fn title(self) -> &'static str {
        match self {
            Block::PracticeHuman => "Bloque de Práctica: Seres Humanos",
            Block::PracticeAi => "Bloque de Práctica: Inteligencia Artificial",
            Block::CombinedCongruent => "Bloque Combinado",
            Block::CombinedReversed => "Bloque de Inversión",
        }
    }
}

impl TryFrom<u8> for Block {
    type Error = ConfigError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Block::PracticeHuman),
            2 => Ok(Block::PracticeAi),
            3 => Ok(Block::CombinedCongruent),
            4 => Ok(Block::CombinedReversed),
            other => Err(ConfigError::InvalidBlock(other.into())),
        }
    }
}

impl From<Block> for u8 {
    fn from(b: Block) -> u8 {
        b.ordinal()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ordinal())
    }
}

/// A word shown to the participant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stimulus {
    pub text: String,
    pub category: Category,
}

impl Stimulus {
    pub fn new(text: impl Into<String>, category: Category) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

/// One presentation of a stimulus within a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trial {
    stimulus: Stimulus,
    block: Block,
    correct_side: Side,
}

impl Trial {
    pub(crate) fn new(stimulus: Stimulus, block: Block, correct_side: Side) -> Self {
        Self {
            stimulus,
            block,
            correct_side,
        }
    }

    pub fn stimulus(&self) -> &Stimulus {
        &self.stimulus
    }

    pub fn block(&self) -> Block {
        self.block
    }

    pub fn correct_side(&self) -> Side {
        self.correct_side
    }
}

/// Recorded result of one answered trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub word: String,
    pub category: Category,
    pub response_side: Side,
    pub is_correct: bool,
    /// Milliseconds from onset to response, three decimals, never negative.
    pub reaction_time_ms: f64,
    /// `1 - is_correct`.
    pub error_flag: u8,
}

impl TrialOutcome {
    pub fn new(trial: &Trial, response_side: Side, reaction_time_ms: f64) -> Self {
        let is_correct = response_side == trial.correct_side();
        Self {
            word: trial.stimulus().text.clone(),
            category: trial.stimulus().category,
            response_side,
            is_correct,
            reaction_time_ms: round_ms(reaction_time_ms.max(0.0)),
            error_flag: u8::from(!is_correct),
        }
    }
}

/// Aggregate shown at the end of a block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BlockSummary {
    pub block: Block,
    pub total_errors: u32,
    /// Arithmetic mean over recorded outcomes; exactly 0 when there are none.
    pub mean_reaction_time_ms: f64,
    pub is_final_block: bool,
}

impl BlockSummary {
    pub fn from_outcomes(block: Block, outcomes: &[TrialOutcome]) -> Self {
        let total_errors = outcomes.iter().map(|o| o.error_flag as u32).sum();
        let mean_reaction_time_ms = if outcomes.is_empty() {
            0.0
        } else {
            outcomes.iter().map(|o| o.reaction_time_ms).sum::<f64>() / outcomes.len() as f64
        };
        Self {
            block,
            total_errors,
            mean_reaction_time_ms,
            is_final_block: block.is_final(),
        }
    }
}
