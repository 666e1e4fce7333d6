//! Presentation boundary: what the engine hands to a renderer, and how raw
//! input becomes a [`Side`].
//!
//! [`Snapshot`] is an immutable, serializable picture of the session taken
//! after each event. [`KeyBindings`] is the only place that knows about
//! physical keys.

use serde::Serialize;

use crate::constants::{round_ms, DEFAULT_LEFT_KEY, DEFAULT_RIGHT_KEY};
use crate::error::ConfigError;
use crate::response_rules::{instructions, side_labels};
use crate::session::{Phase, Session};
use crate::types::{Block, Category, Side};

/// Key → side mapping. Keys compare case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    left: String,
    right: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left: DEFAULT_LEFT_KEY.to_string(),
            right: DEFAULT_RIGHT_KEY.to_string(),
        }
    }
}

impl KeyBindings {
    pub fn new(left: &str, right: &str) -> Result<Self, ConfigError> {
        let l = left.trim().to_lowercase();
        let r = right.trim().to_lowercase();
        if l.is_empty() || r.is_empty() || l == r {
            return Err(ConfigError::InvalidKeyBindings {
                left: left.to_string(),
                right: right.to_string(),
            });
        }
        Ok(Self { left: l, right: r })
    }

    /// Side bound to `key`, or `None` for any other key.
    pub fn side_for(&self, key: &str) -> Option<Side> {
        let key = key.trim().to_lowercase();
        if key == self.left {
            Some(Side::Left)
        } else if key == self.right {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }
}

/// What the renderer should show.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Trial {
        block: Block,
        block_title: &'static str,
        block_label_left: String,
        block_label_right: String,
        instructions: String,
        stimulus_text: String,
        stimulus_category: Category,
        /// 1-based.
        trial_number: usize,
        trial_count: usize,
    },
    BlockEnd {
        block: Block,
        total_errors: u32,
        mean_reaction_time_ms: f64,
        is_final_block: bool,
    },
    Complete {
        message: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub view: View,
    /// Latest result-log failure, if any outcome could not be persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<String>,
}

impl Snapshot {
    pub fn capture(session: &Session, keys: &KeyBindings) -> Self {
        let block = session.block();
        let view = match session.phase() {
            Phase::AwaitingStimulus | Phase::AwaitingResponse { .. } => {
                match session.current_trial() {
                    Some(trial) => {
                        let (left, right) = side_labels(block);
                        View::Trial {
                            block,
                            block_title: block.title(),
                            block_label_left: left,
                            block_label_right: right,
                            instructions: instructions(
                                block,
                                session.catalog(),
                                keys.left(),
                                keys.right(),
                            ),
                            stimulus_text: trial.stimulus().text.clone(),
                            stimulus_category: trial.stimulus().category,
                            trial_number: session.cursor() + 1,
                            trial_count: session.trial_count(),
                        }
                    }
                    None => View::BlockEnd {
                        block,
                        total_errors: 0,
                        mean_reaction_time_ms: 0.0,
                        is_final_block: block.is_final(),
                    },
                }
            }
            Phase::BlockComplete(summary) => View::BlockEnd {
                block: summary.block,
                total_errors: summary.total_errors,
                mean_reaction_time_ms: round_ms(summary.mean_reaction_time_ms),
                is_final_block: summary.is_final_block,
            },
            Phase::TestComplete => View::Complete {
                message: "Test completado. Gracias por participar.",
            },
        };
        Self {
            view,
            persistence_warning: session.last_persistence_error().map(str::to_string),
        }
    }
}
