use minijinja::{Environment, context};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::entities::patient::PatientInput;
use crate::error::TrialMatchError;
use crate::pipeline::OrchestrationResult;

const DISCLAIMER: &str = "This tool provides informational assistance only and does not replace professional medical advice.";

const ELIGIBILITY_TEMPLATE: &str = r#"# Clinical Trial Matches

Patient: {{ age }} years old with {{ condition }}

Found {{ rows|length }} relevant clinical trial{% if rows|length != 1 %}s{% endif %}.
{% for row in rows %}
## {{ row.title }}

| Field | Value |
|-------|-------|
| ID | {{ row.id }} |
| Condition | {{ row.condition }} |
| Location | {{ row.location }} |
| Eligible | {% if row.eligible %}yes{% else %}no{% endif %} |
{% endfor %}
## Reasoning

{{ reasoning }}

> {{ disclaimer }}

---
Generated {{ generated_at }}
"#;

#[derive(Debug, Serialize)]
struct TrialRow<'a> {
    id: &'a str,
    title: &'a str,
    condition: &'a str,
    location: &'a str,
    eligible: bool,
}

fn rows(result: &OrchestrationResult) -> Vec<TrialRow<'_>> {
    result
        .trials
        .iter()
        .zip(&result.eligibility)
        .map(|(trial, verdict)| TrialRow {
            id: &trial.id,
            title: &trial.title,
            condition: &trial.condition,
            location: &trial.location,
            eligible: verdict.eligible,
        })
        .collect()
}

fn render_at(
    patient: &PatientInput,
    result: &OrchestrationResult,
    generated_at: &str,
) -> Result<String, TrialMatchError> {
    let mut env = Environment::new();
    env.add_template("eligibility.md", ELIGIBILITY_TEMPLATE)?;
    let tmpl = env.get_template("eligibility.md")?;
    let age = patient
        .age
        .as_ref()
        .map_or_else(|| "unknown".to_string(), |a| a.to_string());
    Ok(tmpl.render(context! {
        age => age,
        condition => patient.condition.trim(),
        rows => rows(result),
        reasoning => result.reasoning.as_str(),
        disclaimer => DISCLAIMER,
        generated_at => generated_at,
    })?)
}

/// Renders a pipeline result as a markdown card, one section per trial.
pub fn eligibility_markdown(
    patient: &PatientInput,
    result: &OrchestrationResult,
) -> Result<String, TrialMatchError> {
    let generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".into());
    render_at(patient, result, &generated_at)
}
