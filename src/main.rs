use std::sync::Arc;

use toolbridge::{config::Config, logging, tools, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init_logging(config.log_format);

    let registry = tools::builtin_registry()?;
    let server = Server::builder()
        .registry(Arc::new(registry))
        .server_info(&config.server_name, &config.server_version)
        .build()?;

    tracing::info!(
        name = %config.server_name,
        version = %config.server_version,
        tools = server.registry().len(),
        "starting MCP server"
    );

    toolbridge::serve(server, config.socket, shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
