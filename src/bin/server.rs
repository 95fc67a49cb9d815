use actix_web::{middleware::ErrorHandlers, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use pausa::config;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .pretty()
    .with_max_level(tracing::Level::DEBUG)
    .init();

  let config = config::Server::load().unwrap();
  let addr = (config.ip, config.port);
  let workers = config.workers.get();

  let app = pausa::App::new(config).await.unwrap();
  pausa::database::migrations::run_pending(&app).await.unwrap();

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app.clone()))
      .wrap(TracingLogger::<pausa::http::util::QuieterRootSpanBuilder>::new())
      .wrap(ErrorHandlers::new().default_handler(pausa::http::util::handle_actix_web_error))
      .configure(pausa::http::controllers::configure)
  })
  .workers(workers)
  .bind(addr)
  .unwrap()
  .run()
  .await
  .unwrap();
}
