//! Request keys and response shapes for the dashboard's common API resources.

use serde::{Deserialize, Serialize};

use crate::fetcher::RequestKey;

/// `/debt/?days=` daily national debt history, newest first.
pub fn debt_history(days: Option<u32>) -> RequestKey {
    RequestKey::new("/debt/").opt_param("days", days)
}

/// `/debt/latest`
pub fn debt_latest() -> RequestKey {
    RequestKey::new("/debt/latest")
}

/// `/immigration/summary` for the latest fiscal year.
pub fn immigration_summary() -> RequestKey {
    RequestKey::new("/immigration/summary")
}

/// `/immigration/historical` enforcement series, optionally bounded by fiscal year.
pub fn immigration_historical(start_year: Option<i32>, end_year: Option<i32>) -> RequestKey {
    RequestKey::new("/immigration/historical")
        .opt_param("start_year", start_year)
        .opt_param("end_year", end_year)
}

/// `/immigration/countries` top source countries.
pub fn immigration_countries(limit: Option<u32>) -> RequestKey {
    RequestKey::new("/immigration/countries").opt_param("limit", limit)
}

/// `/employment/unemployment` monthly rate over the last `years` years.
pub fn employment_unemployment(years: Option<u32>) -> RequestKey {
    RequestKey::new("/employment/unemployment").opt_param("years", years)
}

/// `/housing/dashboard` headline indicators.
pub fn housing_dashboard() -> RequestKey {
    RequestKey::new("/housing/dashboard")
}

/// `/housing/compare` observations for several series, optionally bounded by `YYYY-MM-DD` dates.
pub fn housing_compare(
    series_ids: &[&str],
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> RequestKey {
    RequestKey::new("/housing/compare")
        .param("series_ids", series_ids.join(","))
        .opt_param("start_date", start_date)
        .opt_param("end_date", end_date)
}

/// `/budget/` federal budget overview for a fiscal year.
pub fn budget_overview(fiscal_year: Option<i32>) -> RequestKey {
    RequestKey::new("/budget/").opt_param("fiscal_year", fiscal_year)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPoint {
    pub date: String,
    pub total_debt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtHistory {
    pub source: String,
    pub fetched_at: String,
    pub data: Vec<DebtPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestDebt {
    pub date: String,
    pub total_debt: f64,
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmigrationTotals {
    pub legal_admissions: u64,
    pub removals: u64,
    pub border_encounters: u64,
    #[serde(default)]
    pub admission_to_removal_ratio: Option<String>,
    #[serde(default)]
    pub net_legal_migration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmigrationSummary {
    pub source: String,
    pub fetched_at: String,
    pub fiscal_year: i32,
    pub summary: ImmigrationTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCountry {
    pub country: String,
    pub admissions: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmigrationCountries {
    pub source: String,
    pub fetched_at: String,
    pub fiscal_year: i32,
    pub countries: Vec<SourceCountry>,
    #[serde(default)]
    pub total_countries_in_data: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingIndicator {
    pub series_id: String,
    pub title: String,
    pub category: String,
    pub units: String,
    pub latest_date: Option<String>,
    pub latest_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingDashboard {
    pub source: String,
    pub indicators: Vec<HousingIndicator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingObservation {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingSeries {
    pub series_id: String,
    pub title: String,
    pub units: String,
    pub observations: Vec<HousingObservation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingCompare {
    pub source: String,
    pub series: Vec<HousingSeries>,
}
