//! `mcremote tools`: list the registered tools.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(None).map_err(|e| format!("Failed to load config: {e}"))?;
    let server = super::build_server(&config)?;
    let definitions = server.registry().definitions();

    println!("⛏️  mcremote tools ({})", definitions.len());
    println!("=====================");
    for def in &definitions {
        println!("  {:<22} {}", def.name, def.description);
    }
    Ok(())
}
