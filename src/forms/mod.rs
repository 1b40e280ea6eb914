//! Request payloads accepted by the leads API.

use thiserror::Error;
use validator::ValidationErrors;

pub mod leads;

#[derive(Debug, Error)]
/// Errors that can occur when processing request payloads.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid name")]
    InvalidName,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid phone number")]
    InvalidPhoneNumber,

    #[error("invalid company")]
    InvalidCompany,

    #[error("invalid notes")]
    InvalidNotes,

    #[error("stage must not be negative")]
    InvalidStage,

    #[error("invalid lead id")]
    InvalidLeadId,

    #[error("field `{0}` cannot be null")]
    NotNullable(&'static str),
}
