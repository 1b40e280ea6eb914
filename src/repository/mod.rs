use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;

use crate::db::{DbConnection, DbPool, get_connection};
use crate::domain::lead::{Lead, NewLead, UpdateLead};
use crate::domain::types::{LeadId, LeadStage, TypeConstraintError};
use crate::repository::errors::RepositoryResult;

pub mod errors;
pub mod lead;
#[cfg(feature = "test-mocks")]
pub mod mock;

/// Diesel-backed repository sharing one connection pool.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Validates that the page's offset fits the signed 64-bit range the
    /// database takes.
    pub fn new(page: usize, per_page: usize) -> Result<Self, TypeConstraintError> {
        page.max(1)
            .saturating_sub(1)
            .checked_mul(per_page)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .map(|_| Self { page, per_page })
            .ok_or_else(|| {
                TypeConstraintError::InvalidValue(format!(
                    "page {page} with limit {per_page} is out of range"
                ))
            })
    }

    /// Number of rows to skip; page numbers start at one.
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1) * self.per_page
    }
}

/// Ordering of leads by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "sort must be `asc` or `desc`, got `{other}`"
            ))),
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Filters applied when listing leads. All present filters are combined with `AND`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadListQuery {
    /// Inclusive lower bound on the creation date.
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound on the creation date.
    pub to_date: Option<NaiveDate>,
    pub engaged: Option<bool>,
    pub stage: Option<LeadStage>,
    /// Case-insensitive substring matched against the text columns.
    pub search: Option<String>,
    pub sort: SortDirection,
    pub pagination: Option<Pagination>,
}

impl LeadListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_date(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn to_date(mut self, date: NaiveDate) -> Self {
        self.to_date = Some(date);
        self
    }

    pub fn engaged(mut self, engaged: bool) -> Self {
        self.engaged = Some(engaged);
        self
    }

    pub fn stage(mut self, stage: LeadStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, sort: SortDirection) -> Self {
        self.sort = sort;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }

    pub fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

pub trait LeadReader {
    fn get_lead_by_id(&self, id: LeadId) -> RepositoryResult<Option<Lead>>;
    /// Returns the total number of matching leads and the requested page.
    fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)>;
}

pub trait LeadWriter {
    fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<Lead>;
    /// Fails with `NotFound` when no lead has the given id.
    fn update_lead(&self, id: LeadId, updates: &UpdateLead) -> RepositoryResult<Lead>;
    /// Removes every listed lead in one statement, ignoring unknown ids.
    fn delete_leads(&self, ids: &[LeadId]) -> RepositoryResult<usize>;
}
