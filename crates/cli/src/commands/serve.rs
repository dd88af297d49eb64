//! `mcremote serve`: run the tool server on stdio.

use tracing::info;

pub async fn run(backend: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(backend).map_err(|e| format!("Failed to load config: {e}"))?;
    let server = super::build_server(&config)?;

    info!(
        backend = %config.backend.kind,
        tools = server.registry().len(),
        "Tool registry ready"
    );
    eprintln!("MCP Minecraft Remote Server running on stdio");

    server.serve_stdio().await?;
    Ok(())
}
