use crate::entities::trial::TrialRecord;
use crate::sources::clinicaltrials::CtGovStudy;

const MISSING_ID: &str = "N/A";
const MISSING_TITLE: &str = "No title";
const MISSING_TEXT: &str = "Unknown";

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn from_ctgov_study(study: &CtGovStudy) -> TrialRecord {
    let section = study.protocol_section.as_ref();
    let ident = section.and_then(|p| p.identification_module.as_ref());

    let id = non_empty(ident.and_then(|m| m.nct_id.as_deref()))
        .unwrap_or_else(|| MISSING_ID.to_string());
    let title = non_empty(ident.and_then(|m| m.brief_title.as_deref()))
        .unwrap_or_else(|| MISSING_TITLE.to_string());
    let condition = non_empty(
        section
            .and_then(|p| p.conditions_module.as_ref())
            .and_then(|m| m.conditions.as_deref())
            .and_then(|c| c.first())
            .map(String::as_str),
    )
    .unwrap_or_else(|| MISSING_TEXT.to_string());
    let location = non_empty(
        section
            .and_then(|p| p.contacts_locations_module.as_ref())
            .and_then(|m| m.locations.as_deref())
            .and_then(|l| l.first())
            .and_then(|l| l.country.as_deref()),
    )
    .unwrap_or_else(|| MISSING_TEXT.to_string());

    TrialRecord {
        id,
        title,
        condition,
        location,
    }
}
