use anyhow::Result;
use clap::Parser;
use compressor::cli::{self, Args};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    cli::run(Args::parse()).await?;
    Ok(())
}
