//! Diesel implementation of the lead repository.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::{
    db::unicode_lower,
    domain::{
        lead::{Lead, NewLead, UpdateLead},
        types::LeadId,
    },
    models::lead::{Lead as DbLead, NewLead as DbNewLead, UpdateLead as DbUpdateLead},
    repository::{
        DieselRepository, LeadListQuery, LeadReader, LeadWriter, SortDirection,
        errors::{RepositoryError, RepositoryResult},
    },
};

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Escapes `LIKE` wildcards so user input is matched literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn into_domain(db_leads: Vec<DbLead>) -> RepositoryResult<Vec<Lead>> {
    db_leads
        .into_iter()
        .map(|lead| Lead::try_from(lead).map_err(RepositoryError::from))
        .collect()
}

impl LeadReader for DieselRepository {
    fn get_lead_by_id(&self, id: LeadId) -> RepositoryResult<Option<Lead>> {
        use crate::schema::leads;

        let mut conn = self.conn()?;
        let db_lead = leads::table
            .find(id.get())
            .first::<DbLead>(&mut conn)
            .optional()?;

        match db_lead {
            Some(db_lead) => Ok(Some(Lead::try_from(db_lead)?)),
            None => Ok(None),
        }
    }

    fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)> {
        use crate::schema::leads;

        let mut conn = self.conn()?;

        let from = query.from_date.map(start_of_day);
        // Inclusive upper date becomes an exclusive bound at the next midnight.
        let until = query
            .to_date
            .and_then(|date| date.succ_opt())
            .map(start_of_day);
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| like_pattern(&term.to_lowercase()));

        let query_builder = || {
            let mut items = leads::table.into_boxed::<Sqlite>();

            if let Some(from) = from {
                items = items.filter(leads::created_at.ge(from));
            }
            if let Some(until) = until {
                items = items.filter(leads::created_at.lt(until));
            }
            if let Some(engaged) = query.engaged {
                items = items.filter(leads::engaged.eq(engaged));
            }
            if let Some(stage) = query.stage {
                items = items.filter(leads::stage.eq(stage.get()));
            }
            if let Some(pattern) = &pattern {
                // Both sides are folded so non-ASCII letters match in any case.
                items = items.filter(
                    unicode_lower(leads::name.nullable())
                        .like(pattern.clone())
                        .escape('\\')
                        .or(unicode_lower(leads::email).like(pattern.clone()).escape('\\'))
                        .or(unicode_lower(leads::phone).like(pattern.clone()).escape('\\'))
                        .or(unicode_lower(leads::company).like(pattern.clone()).escape('\\'))
                        .or(unicode_lower(leads::notes).like(pattern.clone()).escape('\\')),
                );
            }
            items
        };

        // Get the total count before applying pagination
        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = match query.sort {
            SortDirection::Asc => {
                query_builder().order((leads::created_at.asc(), leads::id.asc()))
            }
            SortDirection::Desc => {
                query_builder().order((leads::created_at.desc(), leads::id.desc()))
            }
        };

        if let Some(pagination) = &query.pagination {
            items = items
                .offset(pagination.offset() as i64)
                .limit(pagination.per_page as i64);
        }

        let db_leads = items.load::<DbLead>(&mut conn)?;

        Ok((total, into_domain(db_leads)?))
    }
}

impl LeadWriter for DieselRepository {
    fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<Lead> {
        use crate::schema::leads;

        let mut conn = self.conn()?;
        let insertable: DbNewLead = new_lead.into();

        let created = diesel::insert_into(leads::table)
            .values(&insertable)
            .get_result::<DbLead>(&mut conn)?;

        Ok(Lead::try_from(created)?)
    }

    fn update_lead(&self, id: LeadId, updates: &UpdateLead) -> RepositoryResult<Lead> {
        use crate::schema::leads;

        let mut conn = self.conn()?;
        let changes: DbUpdateLead = updates.into();

        let updated = diesel::update(leads::table.find(id.get()))
            .set(&changes)
            .get_result::<DbLead>(&mut conn)?;

        Ok(Lead::try_from(updated)?)
    }

    fn delete_leads(&self, ids: &[LeadId]) -> RepositoryResult<usize> {
        use crate::schema::leads;

        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let raw_ids = ids.iter().map(|id| id.get()).collect::<Vec<i32>>();

        let deleted =
            diesel::delete(leads::table.filter(leads::id.eq_any(raw_ids))).execute(&mut conn)?;

        Ok(deleted)
    }
}
