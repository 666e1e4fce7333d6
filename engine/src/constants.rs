//! Test constants: block ordinals, log schema, and configuration defaults.

use std::time::Duration;

/// Number of blocks in a full test (PracticeHuman .. CombinedReversed).
pub const BLOCK_COUNT: u8 = 4;

/// Example words listed in practice block instructions.
pub const INSTRUCTION_EXAMPLES: usize = 3;

/// Reaction times are stored with this many decimals (0.001 ms).
pub const REACTION_TIME_DECIMALS: i32 = 3;

/// Longest wait for the result log's advisory lock before a write gives up.
pub const LOG_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause between attempts to take the result log's lock.
pub const LOG_LOCK_RETRY: Duration = Duration::from_millis(10);

/// Result log header, in column order.
pub const LOG_HEADER: [&str; 6] = ["word", "tipo", "respuesta", "correcto", "tiempo_ms", "error"];

/// Default result log location, relative to `IAT_BASE_PATH`.
pub const DEFAULT_RESULTS_PATH: &str = "data/iat_results.csv";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 9000;

/// Default key bound to [`crate::types::Side::Left`].
pub const DEFAULT_LEFT_KEY: &str = "e";

/// Default key bound to [`crate::types::Side::Right`].
pub const DEFAULT_RIGHT_KEY: &str = "i";

/// Round a millisecond value to [`REACTION_TIME_DECIMALS`] places.
///
/// Idempotent: a value that already has at most three decimals is returned
/// unchanged.
#[inline]
pub fn round_ms(ms: f64) -> f64 {
    let scale = 10f64.powi(REACTION_TIME_DECIMALS);
    (ms * scale).round() / scale
}
