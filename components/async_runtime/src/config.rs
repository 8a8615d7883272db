//! Event loop configuration.

/// Default number of tasks a single run call may execute.
pub const DEFAULT_MAX_TURNS: usize = 1_000_000;

/// Configuration for an [`EventLoop`](crate::EventLoop).
///
/// # Examples
///
/// ```
/// use async_runtime::EventLoopConfig;
///
/// let config = EventLoopConfig::default().with_max_turns(Some(10));
/// assert_eq!(config.max_turns, Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLoopConfig {
    /// Maximum number of tasks `run_until_done` executes before giving up.
    /// `None` disables the limit.
    /// Default: 1_000_000
    pub max_turns: Option<usize>,
}

impl EventLoopConfig {
    /// Sets the turn limit.
    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            max_turns: Some(DEFAULT_MAX_TURNS),
        }
    }
}
