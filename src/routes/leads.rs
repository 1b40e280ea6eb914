use actix_web::http::header::{self, ContentType};
use actix_web::{HttpResponse, Responder, delete, get, post, put, web};

use crate::dto::leads::LeadListParams;
use crate::forms::leads::{CreateLeadForm, DeleteLeadsForm, UpdateLeadForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::service_error_response;
use crate::services::leads as leads_service;

#[post("/")]
pub async fn create_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CreateLeadForm>,
) -> impl Responder {
    match leads_service::create_lead(repo.get_ref(), &user, form) {
        Ok(lead) => HttpResponse::Created().json(lead),
        Err(err) => service_error_response(err),
    }
}

#[get("/export")]
pub async fn export_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<LeadListParams>,
) -> impl Responder {
    match leads_service::export_leads_csv(repo.get_ref(), &user, params) {
        Ok(Some(csv)) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                "attachment; filename=leads.csv",
            ))
            .body(csv),
        Ok(None) => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body("No data available"),
        Err(err) => service_error_response(err),
    }
}

#[get("/{lead_id}")]
pub async fn get_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    lead_id: web::Path<i32>,
) -> impl Responder {
    match leads_service::get_lead(repo.get_ref(), &user, lead_id.into_inner()) {
        Ok(lead) => HttpResponse::Ok().json(lead),
        Err(err) => service_error_response(err),
    }
}

#[put("/{lead_id}")]
pub async fn update_lead(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    lead_id: web::Path<i32>,
    web::Json(form): web::Json<UpdateLeadForm>,
) -> impl Responder {
    match leads_service::update_lead(repo.get_ref(), &user, lead_id.into_inner(), form) {
        Ok(lead) => HttpResponse::Ok().json(lead),
        Err(err) => service_error_response(err),
    }
}

#[delete("/")]
pub async fn delete_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<DeleteLeadsForm>,
) -> impl Responder {
    match leads_service::delete_leads(repo.get_ref(), &user, form) {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(err) => service_error_response(err),
    }
}

#[get("/")]
pub async fn list_leads(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<LeadListParams>,
) -> impl Responder {
    match leads_service::list_leads(repo.get_ref(), &user, params) {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => service_error_response(err),
    }
}
