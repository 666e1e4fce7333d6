//! Trial session state machine.
//!
//! ```text
//!            present()                 submit_response()
//! AwaitingStimulus ──────► AwaitingResponse ──────► (Recording) ──┬─► AwaitingStimulus
//!                                                                 └─► BlockComplete
//! BlockComplete ── advance() ──► AwaitingStimulus of the next block
//!                            └─► TestComplete (after block 4, terminal)
//! ```
//!
//! Recording is not an observable phase: appending the outcome, persisting
//! it, and moving the cursor all happen inside the `submit_response` call.
//!
//! Time is passed in by the caller. The adapter reads the monotonic clock at
//! the moment input arrives and when the stimulus is shown, so render latency
//! never inflates a reaction time. Events that do not fit the current phase
//! are reported as [`Transition::Ignored`] and change nothing.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::ConfigError;
use crate::recorder::ResultRecorder;
use crate::trial_generator::generate;
use crate::types::{Block, BlockSummary, Side, Trial, TrialOutcome};

/// Observable session phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    /// Current trial has not been shown yet.
    AwaitingStimulus,
    /// Current trial is on screen since `onset`.
    AwaitingResponse { onset: Instant },
    /// Every trial of the block has been answered.
    BlockComplete(BlockSummary),
    /// Block 4 finished and was advanced past. Terminal.
    TestComplete,
}

/// External input, already translated from keys or pointers into sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Response(Side),
    /// Response meant for the trial at `trial` (0-based). Dropped as stale if
    /// a different trial is on screen.
    ResponseFor { trial: usize, side: Side },
    Advance,
}

/// Why an event was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// No stimulus is on screen (not presented yet, or already answered).
    NoActiveTrial,
    /// Input did not map to a side.
    UnrecognizedInput,
    /// Input referred to a trial other than the current one.
    StaleTrial,
    /// Advance requested while the block still has trials.
    BlockNotComplete,
    /// The test is over.
    TestComplete,
}

/// Effect of one event on the session.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    Recorded(TrialOutcome),
    EnteredBlock(Block),
    Completed,
    Ignored(IgnoreReason),
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    catalog: Arc<Catalog>,
    recorder: Box<dyn ResultRecorder>,
    seed: Option<u64>,
    start_block: i64,
}

impl SessionBuilder {
    pub fn new(catalog: Arc<Catalog>, recorder: Box<dyn ResultRecorder>) -> Self {
        Self {
            catalog,
            recorder,
            seed: None,
            start_block: Block::PracticeHuman.ordinal().into(),
        }
    }

    /// Fixed RNG seed for reproducible trial orders.
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Ordinal of the first block (default 1). Validated in [`build`](Self::build).
    pub fn start_block(mut self, ordinal: i64) -> Self {
        self.start_block = ordinal;
        self
    }

    pub fn build(self) -> Result<Session, ConfigError> {
        let block = u8::try_from(self.start_block)
            .map_err(|_| ConfigError::InvalidBlock(self.start_block))
            .and_then(Block::try_from)?;
        let rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let mut session = Session {
            catalog: self.catalog,
            rng,
            recorder: self.recorder,
            block,
            sequence: Vec::new(),
            cursor: 0,
            phase: Phase::AwaitingStimulus,
            results: Vec::new(),
            persistence_failures: 0,
            last_persistence_error: None,
        };
        session.enter_block(block);
        Ok(session)
    }
}

/// One participant's run through the test.
///
/// Owns all of its state; nothing is shared between sessions except the
/// catalog and whatever the recorder writes to.
pub struct Session {
    catalog: Arc<Catalog>,
    rng: SmallRng,
    recorder: Box<dyn ResultRecorder>,
    block: Block,
    sequence: Vec<Trial>,
    cursor: usize,
    phase: Phase,
    /// Outcomes of the current block only.
    results: Vec<TrialOutcome>,
    persistence_failures: u32,
    last_persistence_error: Option<String>,
}

impl Session {
    pub fn builder(catalog: Arc<Catalog>, recorder: Box<dyn ResultRecorder>) -> SessionBuilder {
        SessionBuilder::new(catalog, recorder)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn block(&self) -> Block {
        self.block
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 0-based index of the current trial.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn trial_count(&self) -> usize {
        self.sequence.len()
    }

    /// The trial sequence of the current block.
    pub fn sequence(&self) -> &[Trial] {
        &self.sequence
    }

    /// Trial at the cursor while one is pending or on screen.
    pub fn current_trial(&self) -> Option<&Trial> {
        match self.phase {
            Phase::AwaitingStimulus | Phase::AwaitingResponse { .. } => {
                self.sequence.get(self.cursor)
            }
            _ => None,
        }
    }

    pub fn onset(&self) -> Option<Instant> {
        match self.phase {
            Phase::AwaitingResponse { onset } => Some(onset),
            _ => None,
        }
    }

    /// Outcomes recorded in the current block.
    pub fn results(&self) -> &[TrialOutcome] {
        &self.results
    }

    pub fn summary(&self) -> Option<BlockSummary> {
        match self.phase {
            Phase::BlockComplete(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::TestComplete
    }

    /// Number of outcomes the recorder failed to persist.
    pub fn persistence_failures(&self) -> u32 {
        self.persistence_failures
    }

    /// Message of the most recent persistence failure.
    pub fn last_persistence_error(&self) -> Option<&str> {
        self.last_persistence_error.as_deref()
    }

    /// Show the current trial: records the onset on first presentation.
    ///
    /// Presenting again while a response is pending keeps the original onset.
    pub fn present(&mut self, now: Instant) -> Option<&Trial> {
        match self.phase {
            Phase::AwaitingStimulus => {
                self.phase = Phase::AwaitingResponse { onset: now };
                tracing::debug!(block = %self.block, trial = self.cursor, "stimulus presented");
            }
            Phase::AwaitingResponse { .. } => {}
            Phase::BlockComplete(_) | Phase::TestComplete => return None,
        }
        self.sequence.get(self.cursor)
    }

    /// Apply a response received at `at`.
    pub fn submit_response(&mut self, side: Side, at: Instant) -> Transition {
        let onset = match self.phase {
            Phase::AwaitingResponse { onset } => onset,
            Phase::TestComplete => return Transition::Ignored(IgnoreReason::TestComplete),
            _ => return Transition::Ignored(IgnoreReason::NoActiveTrial),
        };
        let Some(trial) = self.sequence.get(self.cursor) else {
            return Transition::Ignored(IgnoreReason::NoActiveTrial);
        };

        let reaction_ms = at.saturating_duration_since(onset).as_secs_f64() * 1000.0;
        let outcome = TrialOutcome::new(trial, side, reaction_ms);
        self.record(&outcome);
        Transition::Recorded(outcome)
    }

    /// Like [`submit_response`](Self::submit_response), but only if
    /// `trial_index` is still the current trial.
    pub fn submit_response_for(
        &mut self,
        trial_index: usize,
        side: Side,
        at: Instant,
    ) -> Transition {
        if matches!(self.phase, Phase::AwaitingResponse { .. }) && trial_index != self.cursor {
            return Transition::Ignored(IgnoreReason::StaleTrial);
        }
        self.submit_response(side, at)
    }

    /// Leave a completed block: enter the next one, or finish the test after
    /// block 4.
    pub fn advance(&mut self) -> Transition {
        match self.phase {
            Phase::BlockComplete(_) => match self.block.next() {
                Some(next) => {
                    self.enter_block(next);
                    Transition::EnteredBlock(next)
                }
                None => {
                    self.phase = Phase::TestComplete;
                    tracing::info!(
                        persistence_failures = self.persistence_failures,
                        "test complete"
                    );
                    Transition::Completed
                }
            },
            Phase::TestComplete => Transition::Ignored(IgnoreReason::TestComplete),
            Phase::AwaitingStimulus | Phase::AwaitingResponse { .. } => {
                Transition::Ignored(IgnoreReason::BlockNotComplete)
            }
        }
    }

    /// Single entry point for adapters.
    pub fn handle(&mut self, event: SessionEvent, at: Instant) -> Transition {
        match event {
            SessionEvent::Response(side) => self.submit_response(side, at),
            SessionEvent::ResponseFor { trial, side } => self.submit_response_for(trial, side, at),
            SessionEvent::Advance => self.advance(),
        }
    }

    /// Append, persist, and move the cursor.
    fn record(&mut self, outcome: &TrialOutcome) {
        self.results.push(outcome.clone());

        match self.recorder.record(outcome) {
            Ok(()) => tracing::debug!(
                block = %self.block,
                word = %outcome.word,
                correct = outcome.is_correct,
                reaction_time_ms = outcome.reaction_time_ms,
                "trial recorded"
            ),
            Err(e) => {
                self.persistence_failures += 1;
                tracing::warn!(
                    error = %e,
                    word = %outcome.word,
                    failures = self.persistence_failures,
                    "failed to persist trial outcome, keeping it in memory"
                );
                self.last_persistence_error = Some(e.to_string());
            }
        }

        self.cursor += 1;
        self.phase = if self.cursor >= self.sequence.len() {
            self.complete_block()
        } else {
            Phase::AwaitingStimulus
        };
    }

    fn complete_block(&self) -> Phase {
        let summary = BlockSummary::from_outcomes(self.block, &self.results);
        tracing::info!(
            block = %self.block,
            total_errors = summary.total_errors,
            mean_reaction_time_ms = summary.mean_reaction_time_ms,
            "block complete"
        );
        Phase::BlockComplete(summary)
    }

    fn enter_block(&mut self, block: Block) {
        self.block = block;
        self.sequence = generate(block, &self.catalog, &mut self.rng);
        self.cursor = 0;
        self.results.clear();
        self.phase = if self.sequence.is_empty() {
            self.complete_block()
        } else {
            Phase::AwaitingStimulus
        };
        tracing::info!(block = %block, trials = self.sequence.len(), "entered block");
    }
}
