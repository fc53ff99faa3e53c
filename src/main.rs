use tracing::info;

use pdf_assistant::config::{self, Settings};
use pdf_assistant::{run_server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load env
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(config::log_level())
        .init();

    let settings = Settings::from_env();
    let state = AppState::new(&settings)?;
    info!(
        local_enabled = settings.local_enabled,
        max_upload_bytes = settings.max_upload_bytes,
        "PDF assistant initialized"
    );

    run_server(state, &settings.bind_addr).await
}
