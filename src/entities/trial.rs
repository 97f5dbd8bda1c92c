use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TrialMatchError;
use crate::sources::clinicaltrials::{ClinicalTrialsClient, CtGovSearchParams};
use crate::transform;

/// Registry page size; also the upper bound on returned trials.
pub const TRIAL_PAGE_SIZE: usize = 10;
pub const DEFAULT_CONDITION: &str = "diabetes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id: String,
    pub title: String,
    pub condition: String,
    pub location: String,
}

/// Placeholder trials served whenever the registry cannot produce results.
///
/// These are always diabetes studies, whatever condition was asked for.
pub fn fallback_trials() -> Vec<TrialRecord> {
    vec![
        TrialRecord {
            id: "NCT00000001".into(),
            title: "Type 2 Diabetes Clinical Study".into(),
            condition: "Diabetes".into(),
            location: "United States".into(),
        },
        TrialRecord {
            id: "NCT00000002".into(),
            title: "Insulin Resistance Research Trial".into(),
            condition: "Diabetes".into(),
            location: "India".into(),
        },
    ]
}

/// Only an absent or empty condition falls back; anything else is sent as is.
fn search_term(condition: Option<&str>) -> &str {
    condition
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_CONDITION)
}

/// Queries the registry once and normalizes the studies it returns.
///
/// # Errors
///
/// Returns an error on transport failure, a non-success status, an undecodable
/// body, or an empty `studies` list.
pub async fn search(
    client: &ClinicalTrialsClient,
    condition: Option<&str>,
) -> Result<Vec<TrialRecord>, TrialMatchError> {
    let term = search_term(condition);
    let resp = client
        .search(&CtGovSearchParams {
            query_term: Some(term.to_string()),
            page_size: TRIAL_PAGE_SIZE,
        })
        .await?;

    let studies = resp.studies.unwrap_or_default();
    if studies.is_empty() {
        return Err(TrialMatchError::Api {
            api: crate::sources::clinicaltrials::CTGOV_API.to_string(),
            message: format!("No studies returned for '{term}'"),
        });
    }

    debug!(term, count = studies.len(), "registry returned studies");
    Ok(studies
        .iter()
        .take(TRIAL_PAGE_SIZE)
        .map(transform::trial::from_ctgov_study)
        .collect())
}

/// Trial lookup that never fails: any registry problem is logged and the
/// fixed fallback set is returned instead.
pub async fn find(client: &ClinicalTrialsClient, condition: Option<&str>) -> Vec<TrialRecord> {
    match search(client, condition).await {
        Ok(trials) => trials,
        Err(err) => {
            warn!(error = %err, "trial lookup failed; serving fallback trials");
            fallback_trials()
        }
    }
}
