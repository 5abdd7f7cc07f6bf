use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use taskboard::config::Config;
use taskboard::mail::{self, MailBackend};
use taskboard::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let mailer = mail::backend_from_config(&config).expect("Failed to initialize mail backend");

    log::info!("Starting taskboard server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    let config_data = web::Data::new(config);
    let mailer_data: web::Data<dyn MailBackend> = web::Data::from(mailer);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(config_data.clone())
            .app_data(mailer_data.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
