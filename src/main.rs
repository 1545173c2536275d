use clap::Parser;

use modbox_lib::commands::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    modbox_lib::init_tracing();
    tracing::debug!("modbox {} starting", env!("CARGO_PKG_VERSION"));

    commands::run(Cli::parse()).await
}
