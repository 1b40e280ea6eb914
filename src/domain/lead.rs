use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CompanyName, LeadEmail, LeadId, LeadName, LeadNotes, LeadStage, PhoneNumber,
};

/// A prospective customer tracked through the sales pipeline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: LeadId,
    pub name: LeadName,
    pub email: Option<LeadEmail>,
    pub phone: Option<PhoneNumber>,
    pub company: Option<CompanyName>,
    pub notes: Option<LeadNotes>,
    pub stage: LeadStage,
    pub engaged: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Lead that has not been persisted yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLead {
    pub name: LeadName,
    pub email: Option<LeadEmail>,
    pub phone: Option<PhoneNumber>,
    pub company: Option<CompanyName>,
    pub notes: Option<LeadNotes>,
    pub stage: LeadStage,
    pub engaged: bool,
    pub created_at: NaiveDateTime,
}

impl NewLead {
    /// Creates a lead stamped with the current UTC time.
    #[must_use]
    pub fn new(name: LeadName, stage: LeadStage, engaged: bool) -> Self {
        Self {
            name,
            email: None,
            phone: None,
            company: None,
            notes: None,
            stage,
            engaged,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[must_use]
    pub fn email(mut self, email: Option<LeadEmail>) -> Self {
        self.email = email;
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: Option<PhoneNumber>) -> Self {
        self.phone = phone;
        self
    }

    #[must_use]
    pub fn company(mut self, company: Option<CompanyName>) -> Self {
        self.company = company;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<LeadNotes>) -> Self {
        self.notes = notes;
        self
    }

    /// Overrides the creation timestamp stamped by [`NewLead::new`].
    #[must_use]
    pub fn created_at(mut self, created_at: NaiveDateTime) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Partial update of a lead.
///
/// `None` keeps the stored value. For nullable attributes `Some(None)` clears
/// the column and `Some(Some(_))` replaces it.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateLead {
    pub name: Option<LeadName>,
    pub email: Option<Option<LeadEmail>>,
    pub phone: Option<Option<PhoneNumber>>,
    pub company: Option<Option<CompanyName>>,
    pub notes: Option<Option<LeadNotes>>,
    pub stage: Option<LeadStage>,
    pub engaged: Option<bool>,
    pub updated_at: NaiveDateTime,
}

impl Default for UpdateLead {
    fn default() -> Self {
        Self {
            name: None,
            email: None,
            phone: None,
            company: None,
            notes: None,
            stage: None,
            engaged: None,
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl UpdateLead {
    /// Returns `true` when no attribute is going to change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
            && self.notes.is_none()
            && self.stage.is_none()
            && self.engaged.is_none()
    }

    /// Applies the update to an in-memory lead the same way storage does.
    pub fn apply_to(&self, lead: &mut Lead) {
        if let Some(name) = &self.name {
            lead.name = name.clone();
        }
        if let Some(email) = &self.email {
            lead.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            lead.phone = phone.clone();
        }
        if let Some(company) = &self.company {
            lead.company = company.clone();
        }
        if let Some(notes) = &self.notes {
            lead.notes = notes.clone();
        }
        if let Some(stage) = self.stage {
            lead.stage = stage;
        }
        if let Some(engaged) = self.engaged {
            lead.engaged = engaged;
        }
        lead.updated_at = self.updated_at;
    }
}
