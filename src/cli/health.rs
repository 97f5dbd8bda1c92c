//! `trialmatch health`: one probe per upstream service the pipeline uses.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;

use crate::config::Config;
use crate::error::TrialMatchError;

const REGISTRY_SERVICE: &str = "ClinicalTrials.gov";
const REASONING_SERVICE: &str = "OpenAI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Error,
    Skipped,
}

impl ProbeStatus {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceProbe {
    pub service: &'static str,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Failure reason, or why the probe was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ServiceProbe {
    /// What the pipeline serves instead while this service is unavailable.
    fn degraded_to(&self) -> Option<&'static str> {
        if self.status == ProbeStatus::Ok {
            return None;
        }
        match self.service {
            REGISTRY_SERVICE => Some("the two placeholder diabetes trials"),
            REASONING_SERVICE => Some("the fixed reasoning sentence"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub probes: Vec<ServiceProbe>,
}

impl HealthReport {
    fn checked(&self) -> impl Iterator<Item = &ServiceProbe> {
        self.probes
            .iter()
            .filter(|p| p.status != ProbeStatus::Skipped)
    }

    /// Skipped services do not count against health.
    pub fn all_healthy(&self) -> bool {
        self.checked().all(|p| p.status == ProbeStatus::Ok)
    }

    pub fn to_markdown(&self) -> String {
        let healthy = self
            .checked()
            .filter(|p| p.status == ProbeStatus::Ok)
            .count();
        let mut out = String::from("# trialmatch Health Check\n\n");
        out.push_str("| Service | Status | Latency | Detail |\n");
        out.push_str("|---------|--------|---------|--------|\n");
        for probe in &self.probes {
            let latency = probe
                .latency_ms
                .map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                probe.service,
                probe.status.label(),
                latency,
                probe.detail.as_deref().unwrap_or("-").replace('|', "\\|"),
            ));
        }

        let degraded: Vec<_> = self
            .probes
            .iter()
            .filter_map(|p| p.degraded_to().map(|fallback| (p.service, fallback)))
            .collect();
        if !degraded.is_empty() {
            out.push_str("\nWhile degraded, requests are answered with:\n");
            for (service, fallback) in degraded {
                out.push_str(&format!("- {service}: {fallback}\n"));
            }
        }

        out.push_str(&format!(
            "\nStatus: {healthy}/{} services healthy\n",
            self.checked().count()
        ));
        out
    }
}

async fn probe(service: &'static str, req: reqwest::RequestBuilder) -> ServiceProbe {
    let start = Instant::now();
    let outcome = req.header(ACCEPT, "application/json").send().await;
    let latency_ms = Some(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));

    let (status, detail) = match outcome {
        Ok(resp) if resp.status().is_success() => (ProbeStatus::Ok, None),
        Ok(resp) => {
            let code = resp.status();
            let body = crate::sources::read_limited_body(resp, service)
                .await
                .unwrap_or_default();
            let excerpt = crate::sources::body_excerpt(&body);
            (ProbeStatus::Error, Some(format!("HTTP {}: {excerpt}", code.as_u16())))
        }
        Err(err) if err.is_timeout() => (ProbeStatus::Error, Some("timed out".into())),
        Err(err) if err.is_connect() => (ProbeStatus::Error, Some("connection failed".into())),
        Err(err) => (ProbeStatus::Error, Some(err.to_string())),
    };

    ServiceProbe {
        service,
        status,
        latency_ms,
        detail,
    }
}

fn probe_client() -> Result<reqwest::Client, TrialMatchError> {
    static PROBE_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

    if let Some(client) = PROBE_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = reqwest::Client::builder()
        // Probes only; the request pipeline keeps client defaults.
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("trialmatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(TrialMatchError::HttpClientInit)?;

    Ok(PROBE_CLIENT.get_or_init(|| client).clone())
}

/// Probes the trial registry and, when a credential is configured, the
/// reasoning service.
///
/// # Errors
///
/// Returns an error when the probe HTTP client cannot be created.
pub async fn check(config: &Config) -> Result<HealthReport, TrialMatchError> {
    let client = probe_client()?;

    let registry = client
        .get(crate::sources::join_endpoint(&config.ctgov_base, "studies"))
        .query(&[("query.term", "cancer"), ("pageSize", "1")]);

    let reasoning = async {
        let Some(key) = config.reasoning.api_key.as_deref() else {
            return ServiceProbe {
                service: REASONING_SERVICE,
                status: ProbeStatus::Skipped,
                latency_ms: None,
                detail: Some("OPENAI_API_KEY not set".into()),
            };
        };
        let req = client
            .get(crate::sources::join_endpoint(&config.reasoning.base, "models"))
            .header(AUTHORIZATION, format!("Bearer {key}"));
        probe(REASONING_SERVICE, req).await
    };

    let (registry, reasoning) = tokio::join!(probe(REGISTRY_SERVICE, registry), reasoning);
    Ok(HealthReport {
        probes: vec![registry, reasoning],
    })
}
