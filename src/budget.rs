//! Evaluation budget configuration

use serde::{Deserialize, Serialize};

/// Maximum number of evaluations an algorithm may spend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationBudget {
    /// `None` means unlimited
    #[serde(default)]
    pub max_evaluations: Option<u64>,
}

impl EvaluationBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn limited(max_evaluations: u64) -> Self {
        Self {
            max_evaluations: Some(max_evaluations),
        }
    }

    /// Evaluations left after `used`, or `None` if unlimited.
    pub fn remaining(&self, used: u64) -> Option<u64> {
        self.max_evaluations.map(|max| max.saturating_sub(used))
    }

    pub fn is_exhausted(&self, used: u64) -> bool {
        self.remaining(used) == Some(0)
    }
}
