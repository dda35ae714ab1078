//! Interview AI CLI and REST API entry point.
//!
//! Binary name: `iai`
//!
//! Parses CLI arguments, loads configuration, opens the usage ledger and
//! wires the failover router, then dispatches to the appropriate command
//! handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,interview_ai=debug",
        _ => "trace",
    };
    interview_ai_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "iai", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    let result = run(cli, state).await;
    interview_ai_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            prompt,
            user,
            premium,
            feature,
            system,
            model,
        } => {
            let args = cli::generate::GenerateArgs {
                prompt,
                user,
                premium,
                feature,
                system,
                model,
            };
            cli::generate::generate(&state, args, cli.json).await?;
        }

        Commands::Keys => {
            cli::keys::keys(&state, cli.json)?;
        }

        Commands::Usage { user_id, days } => {
            cli::usage::usage(&state, &user_id, days, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            if state.config.operators.owner_token_sha256.is_none()
                && state.config.operators.admin_token_sha256.is_empty()
            {
                println!(
                    "  {} No operator tokens in config.toml; admin endpoints will refuse every request.",
                    console::style("!").yellow().bold()
                );
            }
            if state.config.operators.caller_token_sha256.is_empty() {
                println!(
                    "  {} No caller tokens in config.toml; only operators can call /api/v1/ai/generate.",
                    console::style("!").yellow().bold()
                );
            }

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Interview AI API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
