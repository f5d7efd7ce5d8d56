use std::path::Path;

use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;
use serde_json::json;

use crate::{
    configuration::Settings,
    domain::{lead::LeadRecord, run_request::RunRequest},
    error::PipelineError,
    services::{export_leads, ApifyClient, CancelToken, ResultPipeline},
};

#[derive(Serialize)]
struct RunResponse {
    data: Vec<LeadRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download: Option<String>,
}

#[post("")]
async fn start_run(
    apify_client: web::Data<ApifyClient>,
    settings: web::Data<Settings>,
    body: web::Json<RunRequest>,
) -> Result<HttpResponse, PipelineError> {
    let pipeline = ResultPipeline::new(
        apify_client.get_ref(),
        &settings.apify,
        settings.polling.clone(),
    );

    let leads = pipeline
        .run(&body, &mut CancelToken::never())
        .await
        .inspect_err(|e| log::error!("Run failed: {}", e))?;

    let download = match body.export {
        true => {
            let dir = Path::new(&settings.application.export_dir);
            let filename = export_leads(dir, &leads).await?;
            Some(format!("/downloads/{}", filename))
        }
        false => None,
    };

    Ok(HttpResponse::Ok().json(RunResponse {
        data: leads,
        download,
    }))
}

#[get("/{run_id}/dataset")]
async fn get_dataset(
    apify_client: web::Data<ApifyClient>,
    settings: web::Data<Settings>,
    path: web::Path<String>,
) -> HttpResponse {
    let run_id = path.into_inner();
    let pipeline = ResultPipeline::new(
        apify_client.get_ref(),
        &settings.apify,
        settings.polling.clone(),
    );

    match pipeline.fetch_dataset(&run_id).await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(e) => {
            log::error!("Failed to fetch dataset for run {}: {}", run_id, e);
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    }
}
