//! SymptomPanel — free-text symptom description sent to the advisor.

use std::sync::Arc;

use super::SymptomAdvisor;
use crate::notice::Notice;

/// Result of submitting the symptom form.
#[derive(Debug, Clone, PartialEq)]
pub enum SymptomOutcome {
    /// Advisory reply; the input has been cleared.
    Advice { response: String, notice: Notice },
    /// Nothing to send; the advisor was not called.
    Rejected(Notice),
    /// Advisor failed; the input is kept so the user can retry.
    Failed(Notice),
}

pub struct SymptomPanel {
    input: String,
    advisor: Arc<dyn SymptomAdvisor>,
}

impl SymptomPanel {
    pub fn new(advisor: Arc<dyn SymptomAdvisor>) -> Self {
        Self {
            input: String::new(),
            advisor,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty()
    }

    pub async fn submit(&mut self) -> SymptomOutcome {
        if !self.can_submit() {
            return SymptomOutcome::Rejected(Notice::error(
                "Please enter your symptoms",
                "We need to know what you're experiencing to provide advice.",
            ));
        }

        match self.advisor.assess_symptoms(self.input.trim()).await {
            Ok(response) => {
                self.input.clear();
                SymptomOutcome::Advice {
                    response,
                    notice: Notice::info(
                        "Symptom information received",
                        "Review the guidance below. For immediate medical concerns, contact emergency services.",
                    ),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Symptom check failed");
                SymptomOutcome::Failed(Notice::error(
                    "Error",
                    "We couldn't check your symptoms right now. Please try again.",
                ))
            }
        }
    }
}
