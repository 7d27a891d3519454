use serde::Serialize;

use crate::timing::refresh::BusinessStatus;

/// Body of `/api/businesses`.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    computed_at: Option<String>,
    count: usize,
    businesses: Vec<BusinessStatus>,
}

impl ListResponse {
    pub fn new(computed_at: Option<String>, businesses: Vec<BusinessStatus>) -> Self {
        Self {
            computed_at,
            count: businesses.len(),
            businesses,
        }
    }
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    generation: u64,
    computed_at: Option<String>,
}

impl HealthResponse {
    pub fn new(generation: u64, computed_at: Option<String>) -> Self {
        Self {
            status: "ok",
            generation,
            computed_at,
        }
    }
}
