use actix_web::{web, App, HttpServer};
use log::info;
use masspay::services;
use masspay::AppConfig;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    masspay::logging::init(&config)?;

    let bind = (config.host.clone(), config.port);
    info!("Starting server on {}:{}", bind.0, bind.1);

    let data = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .service(services::masspay::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
