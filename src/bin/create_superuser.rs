//! CLI tool to create a staff superuser.
//!
//! Usage: `create-superuser <username> [email]`
//!
//! The password is taken from `BLOG_SUPERUSER_PASSWORD`, or read from the
//! first line of standard input.

use anyhow::{bail, Context, Result};
use std::io::BufRead;
use std::path::Path;

use blog::{
    config::Config,
    db::{
        self,
        repositories::{SqlxSessionRepository, SqlxUserRepository},
    },
    models::CreateUserInput,
    services::UserService,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(username) = args.next() else {
        bail!("usage: create-superuser <username> [email]");
    };
    let email = args.next().unwrap_or_default();

    let password = match std::env::var("BLOG_SUPERUSER_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            eprintln!("Password:");
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let config = Config::load_with_env(Path::new("config.yml"))?;
    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    let users = UserService::new(
        SqlxUserRepository::boxed(pool.clone()),
        SqlxSessionRepository::boxed(pool.clone()),
    );
    let user = users
        .create_superuser(CreateUserInput::new(username, email, password))
        .await?;

    println!("Superuser {} created (id {})", user.username, user.id);
    pool.close().await;
    Ok(())
}
