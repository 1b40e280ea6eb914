use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

use crate::services::ServiceError;

pub mod leads;

/// JSON error body shared by every endpoint.
pub fn detail_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "detail": message.into() }))
}

/// Maps a service failure onto an HTTP response.
pub fn service_error_response(err: ServiceError) -> HttpResponse {
    match err {
        ServiceError::NotFound => detail_response(StatusCode::NOT_FOUND, "Lead not found"),
        ServiceError::Form(message) | ServiceError::TypeConstraint(message) => {
            detail_response(StatusCode::UNPROCESSABLE_ENTITY, message)
        }
        ServiceError::Repository(err) if err.is_client_error() => {
            detail_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        err => {
            log::error!("Request failed: {err}");
            detail_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn unprocessable<E>(err: E, req: &HttpRequest) -> actix_web::Error
where
    E: std::fmt::Display + std::fmt::Debug + 'static,
{
    log::debug!("Rejected {} {}: {err}", req.method(), req.path());
    let response = detail_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string());
    InternalError::from_response(err, response).into()
}

/// Registers the leads API.
///
/// `/leads/export` is registered ahead of `/leads/{id}` so it is not captured
/// by the id route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leads")
            .app_data(web::JsonConfig::default().error_handler(unprocessable))
            .app_data(web::QueryConfig::default().error_handler(unprocessable))
            .app_data(web::PathConfig::default().error_handler(unprocessable))
            .service(leads::create_lead)
            .service(leads::export_leads)
            .service(leads::list_leads)
            .service(leads::delete_leads)
            .service(leads::get_lead)
            .service(leads::update_lead),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;
    use crate::repository::errors::RepositoryError;

    async fn body_of(response: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (
                ServiceError::Form("bad".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::TypeConstraint("bad".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::Repository(RepositoryError::ConstraintViolation("check".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceError::Repository(RepositoryError::ConnectionError("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::Internal("csv".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(service_error_response(err).status(), status);
        }
    }

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let response = service_error_response(ServiceError::Repository(
            RepositoryError::DatabaseError("disk I/O error at /var/db".into()),
        ));
        let body = body_of(response).await;
        assert_eq!(body, json!({ "detail": "Internal server error" }));
    }

    #[actix_web::test]
    async fn form_errors_carry_message() {
        let response = service_error_response(ServiceError::Form("invalid email address".into()));
        let body = body_of(response).await;
        assert_eq!(body, json!({ "detail": "invalid email address" }));
    }
}
