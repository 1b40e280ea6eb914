//! Lead workflows: CRUD, filtered listing and CSV export.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::lead::{Lead, NewLead, UpdateLead};
use crate::domain::types::{LeadId, LeadStage};
use crate::dto::leads::{DeleteLeadsResponse, LeadListParams, LeadListResponse};
use crate::forms::leads::{CreateLeadForm, DeleteLeadsForm, DeleteLeadsPayload, UpdateLeadForm};
use crate::models::auth::AuthenticatedUser;
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{LeadListQuery, LeadReader, LeadWriter, Pagination, SortDirection};
use crate::services::{ServiceError, ServiceResult};

/// Ids that cannot exist in storage are reported as missing rather than invalid.
fn lookup_id(lead_id: i32) -> ServiceResult<LeadId> {
    LeadId::new(lead_id).map_err(|_| ServiceError::NotFound)
}

fn positive_or(value: Option<i64>, default: usize, name: &str) -> ServiceResult<usize> {
    match value {
        None => Ok(default),
        Some(v) if v > 0 => usize::try_from(v)
            .map_err(|_| ServiceError::Form(format!("{name} is too large"))),
        Some(v) => Err(ServiceError::Form(format!(
            "{name} must be a positive integer, got {v}"
        ))),
    }
}

/// Translates the filter part of the parameters into a repository query.
fn filter_query(params: &LeadListParams) -> ServiceResult<LeadListQuery> {
    let mut query = LeadListQuery::new();

    if let Some(sort) = params.sort.as_deref() {
        query = query.sort(sort.parse::<SortDirection>()?);
    }

    if let (Some(from), Some(to)) = (params.from_date, params.to_date)
        && from > to
    {
        return Err(ServiceError::Form(format!(
            "from_date {from} is after to_date {to}"
        )));
    }
    if let Some(from) = params.from_date {
        query = query.from_date(from);
    }
    if let Some(to) = params.to_date {
        query = query.to_date(to);
    }

    if let Some(engaged) = params.engaged {
        query = query.engaged(engaged);
    }
    if let Some(stage) = params.stage {
        query = query.stage(LeadStage::new(stage)?);
    }

    if let Some(term) = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
    {
        query = query.search(term);
    }

    Ok(query)
}

/// Validates the payload and stores a new lead.
pub fn create_lead<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: CreateLeadForm,
) -> ServiceResult<Lead>
where
    R: LeadWriter + ?Sized,
{
    let new_lead = NewLead::try_from(form)?;

    let lead = repo.create_lead(&new_lead).map_err(|err| {
        log::error!("Failed to create a lead: {err}");
        err
    })?;

    log::info!("Lead {} created by {}", lead.id, user.sub);
    Ok(lead)
}

/// Fetches a single lead.
pub fn get_lead<R>(repo: &R, _user: &AuthenticatedUser, lead_id: i32) -> ServiceResult<Lead>
where
    R: LeadReader + ?Sized,
{
    let id = lookup_id(lead_id)?;

    repo.get_lead_by_id(id)?.ok_or(ServiceError::NotFound)
}

/// Applies a partial update; only fields present in the payload change.
pub fn update_lead<R>(
    repo: &R,
    user: &AuthenticatedUser,
    lead_id: i32,
    form: UpdateLeadForm,
) -> ServiceResult<Lead>
where
    R: LeadWriter + ?Sized,
{
    let id = lookup_id(lead_id)?;
    let updates = UpdateLead::try_from(form)?;

    let lead = repo.update_lead(id, &updates).map_err(|err| {
        log::error!("Failed to update lead {id}: {err}");
        ServiceError::from(err)
    })?;

    log::info!("Lead {id} updated by {}", user.sub);
    Ok(lead)
}

/// Removes every listed lead; unknown ids are ignored.
pub fn delete_leads<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: DeleteLeadsForm,
) -> ServiceResult<DeleteLeadsResponse>
where
    R: LeadWriter + ?Sized,
{
    let payload = DeleteLeadsPayload::try_from(form)?;

    let deleted = repo.delete_leads(&payload.ids).map_err(|err| {
        log::error!("Failed to delete leads: {err}");
        err
    })?;

    log::info!(
        "{deleted} of {} requested leads deleted by {}",
        payload.ids.len(),
        user.sub
    );
    Ok(DeleteLeadsResponse { deleted })
}

/// Returns one page of leads matching every provided filter.
pub fn list_leads<R>(
    repo: &R,
    _user: &AuthenticatedUser,
    params: LeadListParams,
) -> ServiceResult<LeadListResponse>
where
    R: LeadReader + ?Sized,
{
    let limit = positive_or(params.limit, DEFAULT_ITEMS_PER_PAGE, "limit")?;
    let page = positive_or(params.page, 1, "page")?;

    let pagination = Pagination::new(page, limit)?;
    let query = filter_query(&params)?.pagination(pagination);

    let (total, leads) = repo.list_leads(query).map_err(|err| {
        log::error!("Failed to list leads: {err}");
        err
    })?;

    Ok(Paginated::new(leads, page, limit, total))
}

#[derive(Serialize)]
struct LeadCsvRow<'a> {
    id: i32,
    name: &'a str,
    email: Option<&'a str>,
    phone: Option<&'a str>,
    company: Option<&'a str>,
    notes: Option<&'a str>,
    stage: i32,
    engaged: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl<'a> From<&'a Lead> for LeadCsvRow<'a> {
    fn from(lead: &'a Lead) -> Self {
        Self {
            id: lead.id.get(),
            name: lead.name.as_str(),
            email: lead.email.as_ref().map(|v| v.as_str()),
            phone: lead.phone.as_ref().map(|v| v.as_str()),
            company: lead.company.as_ref().map(|v| v.as_str()),
            notes: lead.notes.as_ref().map(|v| v.as_str()),
            stage: lead.stage.get(),
            engaged: lead.engaged,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

/// Renders leads as CSV with a header row.
fn render_csv(leads: &[Lead]) -> ServiceResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for lead in leads {
        writer
            .serialize(LeadCsvRow::from(lead))
            .map_err(|err| ServiceError::Internal(format!("Failed to write CSV row: {err}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ServiceError::Internal(format!("Failed to flush CSV: {err}")))?;

    String::from_utf8(bytes).map_err(|err| ServiceError::Internal(err.to_string()))
}

/// Exports the leads matching the filters as CSV.
///
/// Returns `None` when nothing matches so callers can answer with a
/// placeholder instead of a header-only document.
pub fn export_leads_csv<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: LeadListParams,
) -> ServiceResult<Option<String>>
where
    R: LeadReader + ?Sized,
{
    let query = filter_query(&params)?;

    let (_, leads) = repo.list_leads(query).map_err(|err| {
        log::error!("Failed to load leads for export: {err}");
        err
    })?;

    if leads.is_empty() {
        return Ok(None);
    }

    log::info!("{} leads exported by {}", leads.len(), user.sub);
    render_csv(&leads).map(Some)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use super::*;
    use crate::domain::types::{LeadEmail, LeadName};
    use crate::repository::errors::{RepositoryError, RepositoryResult};

    /// In-memory stand-in for the Diesel repository.
    #[derive(Default)]
    struct FakeRepo {
        leads: RefCell<Vec<Lead>>,
        last_query: RefCell<Option<LeadListQuery>>,
    }

    impl LeadReader for FakeRepo {
        fn get_lead_by_id(&self, id: LeadId) -> RepositoryResult<Option<Lead>> {
            Ok(self.leads.borrow().iter().find(|l| l.id == id).cloned())
        }

        fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)> {
            self.last_query.replace(Some(query));
            let leads = self.leads.borrow().clone();
            Ok((leads.len(), leads))
        }
    }

    impl LeadWriter for FakeRepo {
        fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<Lead> {
            let mut leads = self.leads.borrow_mut();
            let next_id = leads.iter().map(|l| l.id.get()).max().unwrap_or(0) + 1;
            let lead = Lead {
                id: LeadId::new(next_id)?,
                name: new_lead.name.clone(),
                email: new_lead.email.clone(),
                phone: new_lead.phone.clone(),
                company: new_lead.company.clone(),
                notes: new_lead.notes.clone(),
                stage: new_lead.stage,
                engaged: new_lead.engaged,
                created_at: new_lead.created_at,
                updated_at: new_lead.created_at,
            };
            leads.push(lead.clone());
            Ok(lead)
        }

        fn update_lead(&self, id: LeadId, updates: &UpdateLead) -> RepositoryResult<Lead> {
            let mut leads = self.leads.borrow_mut();
            let lead = leads
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or(RepositoryError::NotFound)?;
            updates.apply_to(lead);
            Ok(lead.clone())
        }

        fn delete_leads(&self, ids: &[LeadId]) -> RepositoryResult<usize> {
            let mut leads = self.leads.borrow_mut();
            let before = leads.len();
            leads.retain(|l| !ids.contains(&l.id));
            Ok(before - leads.len())
        }
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".to_string(),
            email: "seller@example.com".to_string(),
            name: "Seller".to_string(),
            exp: 0,
        }
    }

    fn create_form(name: &str, stage: i32) -> CreateLeadForm {
        CreateLeadForm {
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            phone: None,
            company: Some("Acme".to_string()),
            notes: None,
            stage,
            engaged: false,
        }
    }

    #[test]
    fn create_assigns_fresh_ids_and_keeps_values() {
        let repo = FakeRepo::default();

        let first = create_lead(&repo, &user(), create_form("Ann", 1)).unwrap();
        let second = create_lead(&repo, &user(), create_form("Ben", 2)).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.name, LeadName::new("Ann").unwrap());
        assert_eq!(first.email, Some(LeadEmail::new("ann@example.com").unwrap()));
        assert_eq!(second.stage.get(), 2);
    }

    #[test]
    fn retrieve_returns_created_lead() {
        let repo = FakeRepo::default();
        let created = create_lead(&repo, &user(), create_form("Ann", 1)).unwrap();

        let fetched = get_lead(&repo, &user(), created.id.get()).unwrap();

        assert_eq!(fetched, created);
    }

    #[test]
    fn retrieve_unknown_or_invalid_id_is_not_found() {
        let repo = FakeRepo::default();
        assert!(matches!(
            get_lead(&repo, &user(), 42),
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            get_lead(&repo, &user(), -1),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn partial_update_changes_only_given_fields() {
        let repo = FakeRepo::default();
        let created = create_lead(&repo, &user(), create_form("Ann", 1)).unwrap();

        let form = UpdateLeadForm {
            engaged: Some(Some(true)),
            company: Some(None),
            ..UpdateLeadForm::default()
        };
        let updated = update_lead(&repo, &user(), created.id.get(), form).unwrap();

        assert!(updated.engaged);
        assert_eq!(updated.company, None);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.stage, created.stage);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn update_missing_lead_is_not_found() {
        let repo = FakeRepo::default();
        let form = UpdateLeadForm {
            stage: Some(Some(2)),
            ..UpdateLeadForm::default()
        };
        assert!(matches!(
            update_lead(&repo, &user(), 9, form),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn update_with_invalid_payload_is_rejected() {
        let repo = FakeRepo::default();
        let created = create_lead(&repo, &user(), create_form("Ann", 1)).unwrap();
        let form = UpdateLeadForm {
            name: Some(None),
            ..UpdateLeadForm::default()
        };
        assert!(matches!(
            update_lead(&repo, &user(), created.id.get(), form),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn delete_then_retrieve_is_not_found() {
        let repo = FakeRepo::default();
        let created = create_lead(&repo, &user(), create_form("Ann", 1)).unwrap();

        let summary = delete_leads(
            &repo,
            &user(),
            DeleteLeadsForm {
                lead_ids: vec![created.id.get(), 999],
            },
        )
        .unwrap();

        assert_eq!(summary, DeleteLeadsResponse { deleted: 1 });
        assert!(matches!(
            get_lead(&repo, &user(), created.id.get()),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn list_uses_defaults() {
        let repo = FakeRepo::default();

        let page = list_leads(&repo, &user(), LeadListParams::default()).unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.limit, DEFAULT_ITEMS_PER_PAGE);
        let query = repo.last_query.borrow().clone().unwrap();
        assert_eq!(query.sort, SortDirection::Desc);
        assert_eq!(
            query.pagination.map(|p| (p.page, p.per_page)),
            Some((1, DEFAULT_ITEMS_PER_PAGE))
        );
        assert_eq!(query.search, None);
    }

    #[test]
    fn list_maps_every_filter() {
        let repo = FakeRepo::default();
        let params = LeadListParams {
            limit: Some(2),
            page: Some(3),
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            to_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            sort: Some("ASC".to_string()),
            engaged: Some(false),
            stage: Some(2),
            search: Some("  acme ".to_string()),
        };

        list_leads(&repo, &user(), params).unwrap();

        let query = repo.last_query.borrow().clone().unwrap();
        assert_eq!(query.sort, SortDirection::Asc);
        assert_eq!(query.from_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(query.to_date, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(query.engaged, Some(false));
        assert_eq!(query.stage.map(LeadStage::get), Some(2));
        assert_eq!(query.search.as_deref(), Some("acme"));
        assert_eq!(query.pagination.map(|p| p.offset()), Some(4));
    }

    #[test]
    fn list_rejects_invalid_parameters() {
        let repo = FakeRepo::default();
        let cases = [
            LeadListParams {
                limit: Some(0),
                ..LeadListParams::default()
            },
            LeadListParams {
                page: Some(-2),
                ..LeadListParams::default()
            },
            LeadListParams {
                from_date: NaiveDate::from_ymd_opt(2024, 2, 1),
                to_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                ..LeadListParams::default()
            },
        ];

        for params in cases {
            assert!(matches!(
                list_leads(&repo, &user(), params),
                Err(ServiceError::Form(_))
            ));
        }

        let bad_sort = LeadListParams {
            sort: Some("sideways".to_string()),
            ..LeadListParams::default()
        };
        assert!(matches!(
            list_leads(&repo, &user(), bad_sort),
            Err(ServiceError::TypeConstraint(_))
        ));

        let out_of_range = LeadListParams {
            page: Some(i64::MAX),
            limit: Some(i64::MAX),
            ..LeadListParams::default()
        };
        assert!(matches!(
            list_leads(&repo, &user(), out_of_range),
            Err(ServiceError::TypeConstraint(_))
        ));

        let bad_stage = LeadListParams {
            stage: Some(-1),
            ..LeadListParams::default()
        };
        assert!(matches!(
            list_leads(&repo, &user(), bad_stage),
            Err(ServiceError::TypeConstraint(_))
        ));
        assert!(repo.last_query.borrow().is_none());
    }

    #[test]
    fn export_of_empty_result_is_none() {
        let repo = FakeRepo::default();
        assert_eq!(
            export_leads_csv(&repo, &user(), LeadListParams::default()).unwrap(),
            None
        );
    }

    #[test]
    fn export_ignores_pagination_and_quotes_values() {
        let repo = FakeRepo::default();
        let mut form = create_form("Ann", 1);
        form.company = Some("Smith, Jones & Co".to_string());
        form.notes = Some("said \"call back\"".to_string());
        let lead = create_lead(&repo, &user(), form).unwrap();

        let params = LeadListParams {
            limit: Some(1),
            page: Some(5),
            ..LeadListParams::default()
        };
        let csv = export_leads_csv(&repo, &user(), params).unwrap().unwrap();

        let query = repo.last_query.borrow().clone().unwrap();
        assert_eq!(query.pagination, None);

        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("id,name,email,phone,company,notes,stage,engaged,created_at,updated_at")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with(&format!(
            "{},Ann,ann@example.com,,\"Smith, Jones & Co\",\"said \"\"call back\"\"\",1,false,",
            lead.id
        )));
        assert_eq!(lines.next(), None);
    }
}
