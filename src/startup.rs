use std::net::TcpListener;

use actix_files::Files;
use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    configuration::Settings,
    error::PipelineError,
    routes::{default_route, order_route, run_route},
    services::{AnonovaClient, ApifyClient},
};

/// Registers every route. Shared with the route tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Unreadable bodies answer with the same `{"error": ...}` shape as the handlers
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| PipelineError::Validation(err.to_string()).into());

    cfg.app_data(json_config)
        .service(default_route::default)
        .service(default_route::health_check)
        .service(
            web::scope("/run")
                .service(run_route::start_run)
                .service(run_route::get_dataset),
        )
        .service(
            web::scope("/orders")
                .service(order_route::create_order)
                .service(order_route::download_order)
                .service(order_route::get_order),
        );
}

pub fn run(
    listener: TcpListener,
    settings: Settings,
    apify_client: ApifyClient,
    anonova_client: AnonovaClient,
) -> Result<Server, std::io::Error> {
    let export_dir = settings.application.export_dir.clone();
    let settings = web::Data::new(settings);
    let apify_client = web::Data::new(apify_client);
    let anonova_client = web::Data::new(anonova_client);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/downloads", export_dir.clone()))
            .configure(configure_routes)
            .app_data(settings.clone())
            .app_data(apify_client.clone())
            .app_data(anonova_client.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
