use anyhow::Context;
use crypto_agent::{init_logging, Application};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("initializing logging")?;

    Application::init().await?.run().await
}
