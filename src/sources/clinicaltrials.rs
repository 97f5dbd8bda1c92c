use std::borrow::Cow;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TrialMatchError;

pub(crate) const CTGOV_API: &str = "clinicaltrials.gov";

#[derive(Clone)]
pub struct ClinicalTrialsClient {
    client: reqwest::Client,
    base: Cow<'static, str>,
}

#[derive(Debug, Clone, Default)]
pub struct CtGovSearchParams {
    /// Free-text search term (`query.term`).
    pub query_term: Option<String>,
    pub page_size: usize,
}

impl ClinicalTrialsClient {
    pub fn new(base: impl Into<Cow<'static, str>>) -> Result<Self, TrialMatchError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: base.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        crate::sources::join_endpoint(&self.base, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, TrialMatchError> {
        let resp = req.header(ACCEPT, "application/json").send().await?;
        let status = resp.status();
        debug!(api = CTGOV_API, %status, "registry responded");
        let bytes = crate::sources::read_limited_body(resp, CTGOV_API).await?;
        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(TrialMatchError::Api {
                api: CTGOV_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }
        serde_json::from_slice(&bytes).map_err(|source| TrialMatchError::ApiJson {
            api: CTGOV_API.to_string(),
            source,
        })
    }

    pub async fn search(
        &self,
        params: &CtGovSearchParams,
    ) -> Result<CtGovSearchResponse, TrialMatchError> {
        let url = self.endpoint("studies");

        let mut req = self.client.get(&url);
        if let Some(v) = params.query_term.as_deref().filter(|v| !v.is_empty()) {
            req = req.query(&[("query.term", v)]);
        }

        let page_size = params.page_size.to_string();
        req = req.query(&[("pageSize", page_size.as_str())]);

        self.get_json(req).await
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtGovSearchResponse {
    pub studies: Option<Vec<CtGovStudy>>,
    pub next_page_token: Option<String>,
    pub total_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtGovStudy {
    pub protocol_section: Option<CtGovProtocolSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtGovProtocolSection {
    pub identification_module: Option<CtGovIdentificationModule>,
    pub conditions_module: Option<CtGovConditionsModule>,
    pub contacts_locations_module: Option<CtGovContactsLocationsModule>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtGovIdentificationModule {
    pub nct_id: Option<String>,
    pub brief_title: Option<String>,
}

// The registry sends `null` for some empty lists, so these stay optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtGovConditionsModule {
    pub conditions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtGovContactsLocationsModule {
    pub locations: Option<Vec<CtGovLocation>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtGovLocation {
    pub facility: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}
