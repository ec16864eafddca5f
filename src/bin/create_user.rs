//! Creates an account from the command line.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loan_tracker::{
    config::Config,
    services::auth::register_user,
    state::AppState,
    validation::auth::{RegisterRequest, normalize_email},
};

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> anyhow::Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;

    let line = lines
        .next_line()
        .await?
        .context("Input closed before all fields were entered")?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let state = AppState::new(&config).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let email = normalize_email(&prompt(&mut lines, "Email: ").await?);
    if state.users.find_by_email(&email).await?.is_some() {
        anyhow::bail!("A user with email {} already exists", email);
    }

    let password = prompt(&mut lines, "Password: ").await?;
    let first_name = prompt(&mut lines, "First name: ").await?;
    let last_name = prompt(&mut lines, "Last name: ").await?;

    let request = RegisterRequest {
        first_name,
        last_name,
        email,
        confirm_password: password.clone(),
        password,
    };

    let user = register_user(state.users.as_ref(), &request).await?;
    tracing::info!("✅ User created with ID: {}", user.id);
    println!("Created user {} <{}> ({})", user.name, user.email, user.id);

    Ok(())
}
