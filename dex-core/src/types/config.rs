//! Interpreter configuration

use tracing::warn;

/// Default ceiling on nested function activations
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// Environment variable overriding `max_call_depth`
pub const MAX_CALL_DEPTH_VAR: &str = "DEX_MAX_CALL_DEPTH";

/// Limits applied while evaluating a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Calls nested deeper than this fail with a StackOverflow error
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl InterpreterConfig {
    /// Defaults, overridden by `DEX_MAX_CALL_DEPTH` when it holds a
    /// positive integer
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(MAX_CALL_DEPTH_VAR) {
            config = config.apply_max_call_depth(&raw);
        }
        config
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth.max(1);
        self
    }

    fn apply_max_call_depth(self, raw: &str) -> Self {
        match raw.trim().parse::<usize>() {
            Ok(depth) if depth > 0 => self.with_max_call_depth(depth),
            _ => {
                warn!(value = raw, "ignoring invalid {}", MAX_CALL_DEPTH_VAR);
                self
            }
        }
    }
}
