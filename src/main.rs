// main.rs
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rxtrace::{
    core::{args::CommandlineArgs, logging::init_logging},
    server::ProxyServer,
    Settings,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("rxtrace: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<u8> {
    let args = CommandlineArgs::parse();
    init_logging().context("Failed to initialize logging")?;

    let settings = Settings::resolve(args).context("Failed to resolve settings")?;
    let server = ProxyServer::new(settings).context("Failed to set up proxy server")?;
    let exit_code = server.run().await.context("Failed to run proxy server")?;

    Ok(exit_code)
}
