use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::domain::lead::{NewLead, UpdateLead};
use crate::domain::types::{
    CompanyName, LeadEmail, LeadId, LeadName, LeadNotes, LeadStage, PhoneNumber,
};
use crate::forms::FormError;

/// Longest accepted lead or company name, in characters.
pub const NAME_MAX_LEN: usize = 200;
/// Longest accepted notes text, in characters.
pub const NOTES_MAX_LEN: usize = 5000;

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Treats blank strings as absent values.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

fn parse_name(value: String) -> Result<LeadName, FormError> {
    if too_long(&value, NAME_MAX_LEN) {
        return Err(FormError::InvalidName);
    }
    LeadName::new(value).map_err(|_| FormError::InvalidName)
}

fn parse_email(value: Option<String>) -> Result<Option<LeadEmail>, FormError> {
    non_blank(value)
        .map(LeadEmail::new)
        .transpose()
        .map_err(|_| FormError::InvalidEmail)
}

fn parse_phone(value: Option<String>) -> Result<Option<PhoneNumber>, FormError> {
    non_blank(value)
        .map(PhoneNumber::new)
        .transpose()
        .map_err(|_| FormError::InvalidPhoneNumber)
}

fn parse_company(value: Option<String>) -> Result<Option<CompanyName>, FormError> {
    match non_blank(value) {
        Some(company) if too_long(&company, NAME_MAX_LEN) => Err(FormError::InvalidCompany),
        Some(company) => CompanyName::new(company)
            .map(Some)
            .map_err(|_| FormError::InvalidCompany),
        None => Ok(None),
    }
}

fn parse_notes(value: Option<String>) -> Result<Option<LeadNotes>, FormError> {
    match non_blank(value) {
        Some(notes) if too_long(&notes, NOTES_MAX_LEN) => Err(FormError::InvalidNotes),
        Some(notes) => LeadNotes::new(notes)
            .map(Some)
            .map_err(|_| FormError::InvalidNotes),
        None => Ok(None),
    }
}

fn parse_stage(value: i32) -> Result<LeadStage, FormError> {
    LeadStage::new(value).map_err(|_| FormError::InvalidStage)
}

#[derive(Debug, Deserialize, Validate)]
/// Body of `POST /leads/`.
pub struct CreateLeadForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stage: i32,
    #[serde(default)]
    pub engaged: bool,
}

impl TryFrom<CreateLeadForm> for NewLead {
    type Error = FormError;

    fn try_from(form: CreateLeadForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let lead = NewLead::new(
            parse_name(form.name)?,
            parse_stage(form.stage)?,
            form.engaged,
        )
        .email(parse_email(form.email)?)
        .phone(parse_phone(form.phone)?)
        .company(parse_company(form.company)?)
        .notes(parse_notes(form.notes)?);

        Ok(lead)
    }
}

#[derive(Debug, Default, Deserialize)]
/// Body of `PUT /leads/{id}`. Missing fields are left unchanged; `null`
/// (or a blank string) clears an optional field.
pub struct UpdateLeadForm {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub stage: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub engaged: Option<Option<bool>>,
}

impl TryFrom<UpdateLeadForm> for UpdateLead {
    type Error = FormError;

    fn try_from(form: UpdateLeadForm) -> Result<Self, Self::Error> {
        let name = match form.name {
            None => None,
            Some(None) => return Err(FormError::NotNullable("name")),
            Some(Some(name)) => Some(parse_name(name)?),
        };
        let stage = match form.stage {
            None => None,
            Some(None) => return Err(FormError::NotNullable("stage")),
            Some(Some(stage)) => Some(parse_stage(stage)?),
        };
        let engaged = match form.engaged {
            None => None,
            Some(None) => return Err(FormError::NotNullable("engaged")),
            Some(Some(engaged)) => Some(engaged),
        };

        Ok(UpdateLead {
            name,
            email: form.email.map(parse_email).transpose()?,
            phone: form.phone.map(parse_phone).transpose()?,
            company: form.company.map(parse_company).transpose()?,
            notes: form.notes.map(parse_notes).transpose()?,
            stage,
            engaged,
            ..UpdateLead::default()
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
/// Body of `DELETE /leads/`.
pub struct DeleteLeadsForm {
    #[validate(length(min = 1))]
    pub lead_ids: Vec<i32>,
}

/// Validated, de-duplicated set of ids to delete.
#[derive(Debug, PartialEq)]
pub struct DeleteLeadsPayload {
    pub ids: Vec<LeadId>,
}

impl TryFrom<DeleteLeadsForm> for DeleteLeadsPayload {
    type Error = FormError;

    fn try_from(form: DeleteLeadsForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let mut ids = form
            .lead_ids
            .into_iter()
            .map(|id| LeadId::new(id).map_err(|_| FormError::InvalidLeadId))
            .collect::<Result<Vec<LeadId>, FormError>>()?;
        ids.sort_unstable();
        ids.dedup();

        Ok(Self { ids })
    }
}
