//! Structured intent extracted from a natural-language turn.

use serde::{Deserialize, Serialize};

/// Coarse action family the router asks the provider to classify a turn
/// into. Unlike a tool-routing-only `Intent`, this also
/// needs to distinguish destructive actions for the ARCHITECT/EXECUTE
/// approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Edit,
    Delete,
    Refactor,
    Explain,
    Query,
}

/// The provider's structured response to an intent-extraction prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: ActionType,
    #[serde(default)]
    pub referenced_files: Vec<String>,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl Intent {
    pub fn promote_confidence(&mut self, threshold: f64) {
        if self.confidence < threshold {
            self.confidence = threshold;
        }
    }
}

/// One candidate reading offered during clarification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationOption {
    pub intent: Intent,
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promote_confidence_raises_below_threshold_only() {
        let mut intent = Intent {
            action: ActionType::Edit,
            referenced_files: vec![],
            confidence: 0.4,
            reasoning: String::new(),
        };
        intent.promote_confidence(0.7);
        assert_eq!(intent.confidence, 0.7);

        intent.confidence = 0.9;
        intent.promote_confidence(0.7);
        assert_eq!(intent.confidence, 0.9);
    }
}
