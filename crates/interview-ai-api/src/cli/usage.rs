//! Per-user usage ledger report.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use crate::state::AppState;

pub async fn usage(state: &AppState, user_id: &str, days: u32, json: bool) -> Result<()> {
    let ledger = state.router.ledger();
    let entries = ledger.report(user_id, days).await?;
    let remaining = ledger.remaining_secondary_quota(user_id, false).await?;

    if json {
        let report = serde_json::json!({
            "user_id": user_id,
            "days": days.max(1),
            "daily_secondary_limit": ledger.daily_limit(),
            "remaining_secondary_today": remaining,
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Usage for {}",
        style("📊").bold(),
        style(user_id).cyan()
    );
    println!();

    if entries.is_empty() {
        println!(
            "  {}",
            style(format!("No calls recorded in the last {} day(s).", days.max(1))).dim()
        );
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Date").fg(Color::White),
            Cell::new("OpenRouter").fg(Color::White),
            Cell::new("OpenAI").fg(Color::White),
            Cell::new("Features").fg(Color::White),
        ]);

        for entry in &entries {
            let mut features: Vec<&str> = entry
                .requests
                .iter()
                .map(|r| r.request_type.as_str())
                .collect();
            features.sort_unstable();
            features.dedup();

            table.add_row(vec![
                Cell::new(entry.date),
                Cell::new(entry.openrouter_count),
                Cell::new(entry.openai_count),
                Cell::new(if features.is_empty() {
                    "-".to_string()
                } else {
                    features.join(", ")
                }),
            ]);
        }

        println!("{table}");
    }

    println!();
    if let Some(left) = remaining {
        println!(
            "  Fallback calls left today: {}/{}",
            style(left).bold(),
            ledger.daily_limit()
        );
        println!();
    }

    Ok(())
}
