use anyhow::Result;
use beacon::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
