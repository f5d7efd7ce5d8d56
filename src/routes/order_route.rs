use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

use crate::{error::PipelineError, services::AnonovaClient};

const DEFAULT_SOURCE_TYPE: &str = "username";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderBody {
    source: Option<String>,
    source_type: Option<String>,
    max_leads: Option<u32>,
}

#[post("")]
async fn create_order(
    anonova_client: web::Data<AnonovaClient>,
    body: web::Json<CreateOrderBody>,
) -> Result<HttpResponse, PipelineError> {
    let source_type = body
        .source_type
        .as_deref()
        .unwrap_or(DEFAULT_SOURCE_TYPE);

    let order = anonova_client
        .create_order(body.source.as_deref(), source_type, body.max_leads)
        .await?;

    Ok(HttpResponse::Ok().json(order))
}

#[get("/{order_id}")]
async fn get_order(
    anonova_client: web::Data<AnonovaClient>,
    path: web::Path<String>,
) -> Result<HttpResponse, PipelineError> {
    let order = anonova_client.order(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

#[get("/{order_id}/download")]
async fn download_order(
    anonova_client: web::Data<AnonovaClient>,
    path: web::Path<String>,
) -> Result<HttpResponse, PipelineError> {
    let csv = anonova_client.download(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().content_type("text/csv").body(csv))
}
