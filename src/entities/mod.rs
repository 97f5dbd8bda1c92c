pub mod eligibility;
pub mod patient;
pub mod reasoning;
pub mod trial;
