use std::sync::Arc;

use tracing::warn;

use crate::config::ReasoningConfig;
use crate::entities::eligibility::EligibilityResult;
use crate::entities::patient::PatientInput;
use crate::error::TrialMatchError;
use crate::sources::openai::{ChatCompletionClient, CompletionBackend};

pub const REASONING_MAX_TOKENS: u32 = 200;

pub const GENERIC_REASONING: &str =
    "Based on age and provided condition, patient may qualify for selected trials.";
pub const EMPTY_REASONING: &str = "No reasoning generated";
pub const UNAVAILABLE_REASONING: &str =
    "Unable to generate reasoning at this time. Please try again later.";

/// Produces the explanation attached to an eligibility list.
///
/// Without a backend every call returns [`GENERIC_REASONING`] and nothing
/// leaves the process.
#[derive(Clone, Default)]
pub struct ReasoningGenerator {
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl ReasoningGenerator {
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Builds the generator from the reasoning section of the process config.
    ///
    /// # Errors
    ///
    /// Returns an error when a credential is present but the HTTP client cannot
    /// be created.
    pub fn from_config(config: &ReasoningConfig) -> Result<Self, TrialMatchError> {
        if !config.is_enabled() {
            return Ok(Self::disabled());
        }
        let client = ChatCompletionClient::new(config)?;
        Ok(Self::with_backend(Arc::new(client)))
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn generate(
        &self,
        patient: &PatientInput,
        eligibility: &[EligibilityResult],
    ) -> String {
        let Some(backend) = self.backend.as_ref() else {
            return GENERIC_REASONING.to_string();
        };

        let result = async {
            let prompt = build_prompt(patient, eligibility)?;
            backend.complete(&prompt, REASONING_MAX_TOKENS).await
        }
        .await;

        match result {
            Ok(Some(text)) => text,
            Ok(None) => EMPTY_REASONING.to_string(),
            Err(err) => {
                warn!(error = %err, "reasoning generation failed");
                UNAVAILABLE_REASONING.to_string()
            }
        }
    }
}

fn build_prompt(
    patient: &PatientInput,
    eligibility: &[EligibilityResult],
) -> Result<String, TrialMatchError> {
    let patient_json = serde_json::to_string(patient)?;
    let eligibility_json = serde_json::to_string(eligibility)?;

    Ok(format!(
        "\nPatient Data: {patient_json}\nTrial Eligibility: {eligibility_json}\n\n\
Provide a concise, professional explanation for the patient about why they may or may not qualify.\n\
Keep it safe and patient-friendly.\n"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Text(&'static str),
        Empty,
        Fail,
    }

    struct ScriptedBackend {
        reply: Reply,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<(String, u32)>>,
    }

    impl ScriptedBackend {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(
            &self,
            prompt: &str,
            max_tokens: u32,
        ) -> Result<Option<String>, TrialMatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some((prompt.to_string(), max_tokens));
            match self.reply {
                Reply::Text(text) => Ok(Some(text.to_string())),
                Reply::Empty => Ok(None),
                Reply::Fail => Err(TrialMatchError::Api {
                    api: "openai".into(),
                    message: "HTTP 429 Too Many Requests: quota".into(),
                }),
            }
        }
    }

    fn eligibility() -> Vec<EligibilityResult> {
        vec![EligibilityResult {
            trial_id: "NCT00000001".into(),
            eligible: true,
        }]
    }

    #[tokio::test]
    async fn disabled_generator_returns_generic_sentence() {
        let generator = ReasoningGenerator::disabled();
        assert!(!generator.is_enabled());
        let text = generator
            .generate(&PatientInput::new(30, "asthma"), &eligibility())
            .await;
        assert_eq!(text, GENERIC_REASONING);
    }

    #[test]
    fn from_config_without_key_is_disabled() {
        let generator = ReasoningGenerator::from_config(&ReasoningConfig::disabled()).unwrap();
        assert!(!generator.is_enabled());
    }

    #[tokio::test]
    async fn backend_text_is_returned() {
        let backend = ScriptedBackend::new(Reply::Text("You are likely eligible."));
        let generator = ReasoningGenerator::with_backend(backend.clone());
        let text = generator
            .generate(&PatientInput::new(30, "asthma"), &eligibility())
            .await;
        assert_eq!(text, "You are likely eligible.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let (prompt, max_tokens) = backend.last_prompt.lock().unwrap().clone().unwrap();
        assert_eq!(max_tokens, REASONING_MAX_TOKENS);
        assert!(prompt.contains(r#"Patient Data: {"age":30,"condition":"asthma"}"#));
        assert!(
            prompt.contains(r#"Trial Eligibility: [{"trialId":"NCT00000001","eligible":true}]"#)
        );
        assert!(prompt.contains("Keep it safe and patient-friendly."));
    }

    #[tokio::test]
    async fn empty_backend_reply_uses_placeholder() {
        let generator = ReasoningGenerator::with_backend(ScriptedBackend::new(Reply::Empty));
        let text = generator
            .generate(&PatientInput::new(30, "asthma"), &eligibility())
            .await;
        assert_eq!(text, EMPTY_REASONING);
    }

    #[tokio::test]
    async fn backend_failure_uses_apology() {
        let backend = ScriptedBackend::new(Reply::Fail);
        let generator = ReasoningGenerator::with_backend(backend.clone());
        let text = generator
            .generate(&PatientInput::new(30, "asthma"), &eligibility())
            .await;
        assert_eq!(text, UNAVAILABLE_REASONING);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
