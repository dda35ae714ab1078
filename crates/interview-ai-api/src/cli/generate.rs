//! One-shot generation from the command line.

use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;

use interview_ai_types::llm::{GenerationMetadata, GenerationOptions};

use crate::state::AppState;

pub struct GenerateArgs {
    pub prompt: String,
    pub user: Option<String>,
    pub premium: bool,
    pub feature: String,
    pub system: Option<String>,
    pub model: Option<String>,
}

/// Run one prompt through the router. Ctrl+C cancels the in-flight call.
pub async fn generate(state: &AppState, args: GenerateArgs, json: bool) -> Result<()> {
    let metadata = GenerationMetadata {
        user_id: args.user,
        is_premium_user: args.premium,
        feature_type: args.feature,
        system_prompt: args.system,
    };
    let options = GenerationOptions {
        model: args.model,
        ..Default::default()
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = state
        .router
        .generate_text_with_cancel(&args.prompt, &metadata, &options, &cancel)
        .await;
    watcher.abort();

    match result {
        Ok(text) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "text": text }))?);
            } else {
                println!("{text}");
            }
            Ok(())
        }
        Err(e) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "error": e.to_string() }))?
                );
            } else {
                eprintln!();
                eprintln!("  {} {}", style("✗").red().bold(), e);
                eprintln!();
            }
            Err(e.into())
        }
    }
}
