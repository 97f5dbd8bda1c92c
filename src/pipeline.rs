//! Trial lookup, eligibility, and reasoning run back to back for one patient.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::entities::eligibility::{self, EligibilityResult};
use crate::entities::patient::PatientInput;
use crate::entities::reasoning::ReasoningGenerator;
use crate::entities::trial::{self, TrialRecord};
use crate::error::TrialMatchError;
use crate::sources::clinicaltrials::ClinicalTrialsClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub trials: Vec<TrialRecord>,
    pub eligibility: Vec<EligibilityResult>,
    pub reasoning: String,
}

/// Shared, read-only handles for every request.
#[derive(Clone)]
pub struct Orchestrator {
    registry: ClinicalTrialsClient,
    reasoning: ReasoningGenerator,
}

impl Orchestrator {
    pub fn new(registry: ClinicalTrialsClient, reasoning: ReasoningGenerator) -> Self {
        Self {
            registry,
            reasoning,
        }
    }

    /// # Errors
    ///
    /// Returns an error when an HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, TrialMatchError> {
        Ok(Self::new(
            ClinicalTrialsClient::new(config.ctgov_base.clone())?,
            ReasoningGenerator::from_config(&config.reasoning)?,
        ))
    }

    pub fn reasoning_enabled(&self) -> bool {
        self.reasoning.is_enabled()
    }

    pub async fn run(&self, patient: &PatientInput) -> OrchestrationResult {
        let trials = trial::find(&self.registry, Some(patient.condition.as_str())).await;
        let eligibility = eligibility::check(patient, &trials);
        let reasoning = self.reasoning.generate(patient, &eligibility).await;

        info!(
            condition = %patient.condition,
            trials = trials.len(),
            eligible = eligibility.iter().filter(|e| e.eligible).count(),
            "eligibility pipeline completed"
        );

        OrchestrationResult {
            trials,
            eligibility,
            reasoning,
        }
    }
}
