use clap::Parser;

use project_dashboard::config::ServerConfig;
use project_dashboard::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ServerConfig::parse();
    server::run(config).await
}
