//! error tolerance policy

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Budget used by [`ErrorPolicy::moderate`]
pub const DEFAULT_MODERATE_BUDGET: u32 = 10;

/// How many frame-level errors a stream may absorb before it is abandoned.
///
/// Fixed for the lifetime of one decoder; each decoder owns its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// any frame error is fatal
    None,
    /// up to the given number of errors
    Moderate(u32),
    /// no budget, only the not-audio rule applies
    All,
}

impl ErrorPolicy {
    /// moderate policy with the default budget
    pub fn moderate() -> Self {
        ErrorPolicy::Moderate(DEFAULT_MODERATE_BUDGET)
    }

    /// tolerated error count, `None` when unbounded
    pub fn budget(self) -> Option<u32> {
        match self {
            ErrorPolicy::None => Some(0),
            ErrorPolicy::Moderate(budget) => Some(budget),
            ErrorPolicy::All => None,
        }
    }

    /// true once `errors` is past the budget
    pub fn is_exceeded(self, errors: u32) -> bool {
        self.budget().is_some_and(|budget| errors > budget)
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::moderate()
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::None => write!(f, "none"),
            ErrorPolicy::Moderate(budget) => write!(f, "moderate={}", budget),
            ErrorPolicy::All => write!(f, "all"),
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "none" => Ok(ErrorPolicy::None),
            "moderate" => Ok(ErrorPolicy::moderate()),
            "all" => Ok(ErrorPolicy::All),
            other => match other.strip_prefix("moderate=") {
                Some(n) => n
                    .parse()
                    .map(ErrorPolicy::Moderate)
                    .map_err(|_| format!("Invalid error budget: {}", n)),
                None => Err(format!(
                    "Invalid error policy: {}. Use: none, moderate, moderate=N, all",
                    s
                )),
            },
        }
    }
}
