use tracing::{info, warn};

use pausa::config;
use pausa::schema::{InsertUser, User};
use pausa::types::Role;
use pausa::util::password;

/// Seeds the first admin account so a fresh deployment can log in
/// and create everybody else. Reads `ADMIN_NAME` / `ADMIN_EMAIL` /
/// `ADMIN_PASSWORD` from the environment (or `.env`).
#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().init();

  let config = config::Server::load().unwrap();
  let app = pausa::App::new(config).await.unwrap();
  pausa::database::migrations::run_pending(&app).await.unwrap();

  let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
  let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@admin.com".to_string());
  let password = match std::env::var("ADMIN_PASSWORD") {
    Ok(password) => password,
    Err(..) => {
      warn!("ADMIN_PASSWORD is not set, seeding with the default password; change it right away");
      "admin123".to_string()
    }
  };

  let mut conn = app.db_write().await.unwrap();
  if User::by_email(&mut conn, &email).await.unwrap().is_some() {
    info!("admin account {email} already exists, nothing to do");
    return;
  }

  let password_hash = password::hash(&password).unwrap();
  let admin = User::insert(
    &mut conn,
    InsertUser {
      name: &name,
      email: &email,
      password_hash: &password_hash,
      role: Role::Admin,
      team_id: None,
      active: true,
    },
  )
  .await
  .unwrap();

  info!("created admin account {} ({})", admin.email, admin.id);
}
