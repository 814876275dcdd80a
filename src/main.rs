use blocklink::cli::commands::run_cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging is initialized by the CLI based on --debug
    run_cli().await?;

    Ok(())
}
