use anyhow::{Context, Result};
use talkback::config::AppConfig;
use talkback::credentials::Credential;
use talkback::session::SessionWorker;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talkback=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting talkback");

    let config = AppConfig::load().context("Failed to load configuration")?;
    if let Err(e) = config.validate() {
        // Missing models are reported in the window; keep going
        warn!("{}", e);
    }

    let credential = Credential::from_env(&config.credential_env).ok();

    let session = SessionWorker::spawn(config, credential).context("Failed to start session")?;

    talkback::ui::run(session).map_err(|e| anyhow::anyhow!("GUI error: {}", e))?;

    info!("Talkback exited");
    Ok(())
}
