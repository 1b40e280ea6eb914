use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::lead::{
    Lead as DomainLead, NewLead as DomainNewLead, UpdateLead as DomainUpdateLead,
};
use crate::domain::types::{
    CompanyName, LeadEmail, LeadId, LeadName, LeadNotes, LeadStage, PhoneNumber,
    TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::leads)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
/// Diesel model for [`crate::domain::lead::Lead`].
pub struct Lead {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub stage: i32,
    pub engaged: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::leads)]
/// Insertable form of [`Lead`].
pub struct NewLead<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub stage: i32,
    pub engaged: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::leads)]
/// Data used when updating a [`Lead`] record. `None` leaves a column untouched.
pub struct UpdateLead<'a> {
    pub name: Option<&'a str>,
    pub email: Option<Option<&'a str>>,
    pub phone: Option<Option<&'a str>>,
    pub company: Option<Option<&'a str>>,
    pub notes: Option<Option<&'a str>>,
    pub stage: Option<i32>,
    pub engaged: Option<bool>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Lead> for DomainLead {
    type Error = TypeConstraintError;

    fn try_from(lead: Lead) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LeadId::new(lead.id)?,
            name: LeadName::new(lead.name)?,
            email: lead.email.map(LeadEmail::new).transpose()?,
            phone: lead.phone.map(PhoneNumber::new).transpose()?,
            company: lead.company.map(CompanyName::new).transpose()?,
            notes: lead.notes.map(LeadNotes::new).transpose()?,
            stage: LeadStage::new(lead.stage)?,
            engaged: lead.engaged,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewLead> for NewLead<'a> {
    fn from(lead: &'a DomainNewLead) -> Self {
        Self {
            name: lead.name.as_str(),
            email: lead.email.as_ref().map(LeadEmail::as_str),
            phone: lead.phone.as_ref().map(PhoneNumber::as_str),
            company: lead.company.as_ref().map(CompanyName::as_str),
            notes: lead.notes.as_ref().map(LeadNotes::as_str),
            stage: lead.stage.get(),
            engaged: lead.engaged,
            created_at: lead.created_at,
            updated_at: lead.created_at,
        }
    }
}

impl<'a> From<&'a DomainUpdateLead> for UpdateLead<'a> {
    fn from(lead: &'a DomainUpdateLead) -> Self {
        Self {
            name: lead.name.as_ref().map(LeadName::as_str),
            email: lead
                .email
                .as_ref()
                .map(|email| email.as_ref().map(LeadEmail::as_str)),
            phone: lead
                .phone
                .as_ref()
                .map(|phone| phone.as_ref().map(PhoneNumber::as_str)),
            company: lead
                .company
                .as_ref()
                .map(|company| company.as_ref().map(CompanyName::as_str)),
            notes: lead
                .notes
                .as_ref()
                .map(|notes| notes.as_ref().map(LeadNotes::as_str)),
            stage: lead.stage.map(LeadStage::get),
            engaged: lead.engaged,
            updated_at: lead.updated_at,
        }
    }
}
