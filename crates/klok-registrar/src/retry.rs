//! Per-identity retry state machine.

/// Lifecycle of one identity's registration attempts.
///
/// `Pending → Attempting(n) → Succeeded | Attempting(n + 1) | Exhausted(n)`.
/// Terminal states absorb every further event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    /// No attempt made yet.
    Pending,
    /// Attempt `n` (1-based) is in flight.
    Attempting(u32),
    /// A token was obtained.
    Succeeded(String),
    /// The last allowed attempt failed.
    Exhausted(u32),
}

impl AttemptState {
    /// Start the first attempt.
    pub fn start(self) -> Self {
        match self {
            AttemptState::Pending => AttemptState::Attempting(1),
            other => other,
        }
    }

    /// Apply the outcome of the in-flight attempt.
    pub fn advance<E>(self, result: Result<String, E>, max_retries: u32) -> Self {
        match self {
            AttemptState::Attempting(n) => match result {
                Ok(token) => AttemptState::Succeeded(token),
                Err(_) if n < max_retries => AttemptState::Attempting(n + 1),
                Err(_) => AttemptState::Exhausted(n),
            },
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Succeeded(_) | AttemptState::Exhausted(_))
    }

    /// Number of the attempt currently in flight, if any.
    pub fn attempt(&self) -> Option<u32> {
        match self {
            AttemptState::Attempting(n) => Some(*n),
            _ => None,
        }
    }
}
