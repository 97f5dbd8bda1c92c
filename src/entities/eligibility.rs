use serde::{Deserialize, Serialize};

use crate::entities::patient::PatientInput;
use crate::entities::trial::TrialRecord;

/// Patients strictly older than this qualify.
pub const ADULT_AGE: f64 = 18.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    pub trial_id: String,
    pub eligible: bool,
}

/// One result per trial, in trial order.
///
/// Only the patient's age is consulted; trial conditions and criteria are
/// not evaluated, so every trial gets the same verdict.
pub fn check(patient: &PatientInput, trials: &[TrialRecord]) -> Vec<EligibilityResult> {
    let eligible = patient
        .known_age()
        .is_some_and(|age| age.years() > ADULT_AGE);
    trials
        .iter()
        .map(|trial| EligibilityResult {
            trial_id: trial.id.clone(),
            eligible,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::patient::Age;
    use crate::entities::trial::fallback_trials;
    use serde_json::json;

    fn trials() -> Vec<TrialRecord> {
        let mut trials = fallback_trials();
        trials.push(TrialRecord {
            id: "NCT09999999".into(),
            title: "Pediatric Asthma Study".into(),
            condition: "Asthma".into(),
            location: "Kenya".into(),
        });
        trials
    }

    fn verdicts(results: &[EligibilityResult]) -> Vec<bool> {
        results.iter().map(|r| r.eligible).collect()
    }

    #[test]
    fn adult_is_eligible_for_every_trial() {
        let results = check(&PatientInput::new(25, "asthma"), &trials());
        assert_eq!(verdicts(&results), [true, true, true]);
    }

    #[test]
    fn child_is_ineligible_for_every_trial() {
        let results = check(&PatientInput::new(10, "asthma"), &trials());
        assert_eq!(verdicts(&results), [false, false, false]);
    }

    #[test]
    fn boundary_age_is_ineligible() {
        let results = check(&PatientInput::new(18, "asthma"), &trials());
        assert!(results.iter().all(|r| !r.eligible));
        let results = check(&PatientInput::new(19, "asthma"), &trials());
        assert!(results.iter().all(|r| r.eligible));
    }

    #[test]
    fn missing_or_zero_age_is_ineligible() {
        let absent = PatientInput {
            age: None,
            condition: "asthma".into(),
        };
        assert!(check(&absent, &trials()).iter().all(|r| !r.eligible));
        assert!(
            check(&PatientInput::new(0, "asthma"), &trials())
                .iter()
                .all(|r| !r.eligible)
        );
    }

    #[test]
    fn loosely_typed_ages_compare_numerically() {
        let verdict = |age: serde_json::Value| {
            let patient = PatientInput::with_age(Age::from_json(age), "asthma");
            check(&patient, &trials()).iter().all(|r| r.eligible)
        };
        assert!(verdict(json!(30.5)));
        assert!(verdict(json!("25")));
        assert!(!verdict(json!(-3)));
        assert!(!verdict(json!("thirty")));
        assert!(!verdict(json!(true)));
        assert!(!verdict(json!({ "years": 40 })));
    }

    #[test]
    fn results_follow_trial_order_and_ids() {
        let trials = trials();
        let results = check(&PatientInput::new(40, "diabetes"), &trials);
        assert_eq!(results.len(), trials.len());
        for (trial, result) in trials.iter().zip(&results) {
            assert_eq!(trial.id, result.trial_id);
        }
    }

    #[test]
    fn no_trials_yields_no_results() {
        assert!(check(&PatientInput::new(40, "diabetes"), &[]).is_empty());
    }

    #[test]
    fn serializes_trial_id_in_camel_case() {
        let json = serde_json::to_value(EligibilityResult {
            trial_id: "NCT00000001".into(),
            eligible: true,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "trialId": "NCT00000001", "eligible": true })
        );
    }
}
