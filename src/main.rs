#![warn(clippy::all)]

use questionnaire_api::{config::Config, run, setup_store, setup_tracing};

#[tokio::main]
async fn main() -> Result<(), handle_errors::Error> {
    let config = Config::new()?;

    setup_tracing(&config);

    let store = setup_store(&config).await?;

    tracing::info!("Questionnaire API starting");
    run(config, store).await;

    Ok(())
}
