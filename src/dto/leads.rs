//! Query and response shapes of the `/leads` endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::lead::Lead;
use crate::pagination::Paginated;

/// Query parameters accepted by `GET /leads/` and `GET /leads/export`.
///
/// Export ignores `limit` and `page`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LeadListParams {
    /// Rows per page, defaults to 10.
    pub limit: Option<i64>,
    /// 1-indexed page number, defaults to 1.
    pub page: Option<i64>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    /// `asc` or `desc` over the creation time, defaults to `desc`.
    pub sort: Option<String>,
    pub engaged: Option<bool>,
    pub stage: Option<i32>,
    pub search: Option<String>,
}

/// Page of leads with navigation metadata.
pub type LeadListResponse = Paginated<Lead>;

/// Result of a bulk delete.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DeleteLeadsResponse {
    pub deleted: usize,
}
