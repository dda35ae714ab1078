//! Configured primary key slots.
//!
//! Lock, cooldown and usage state lives in the serving process, so this
//! command only lists what the environment configures. Live state comes from
//! `GET /api/v1/admin/ai/status` on a running server.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use interview_ai_types::llm::SystemStatus;

use crate::state::AppState;

const LIVE_STATUS_PATH: &str = "/api/v1/admin/ai/status";

#[derive(Debug, Serialize)]
pub struct ConfiguredSlot {
    pub slot: String,
    pub masked_key: String,
}

/// Start-up configuration of the router, without runtime counters.
#[derive(Debug, Serialize)]
pub struct ConfiguredKeys {
    pub primary_slots: Vec<ConfiguredSlot>,
    pub secondary_configured: bool,
    pub daily_secondary_limit: u32,
    pub max_primary_attempts: u32,
    pub live_status: &'static str,
}

impl From<SystemStatus> for ConfiguredKeys {
    fn from(status: SystemStatus) -> Self {
        Self {
            primary_slots: status
                .primary
                .keys
                .into_iter()
                .map(|k| ConfiguredSlot {
                    slot: k.slot,
                    masked_key: k.masked_key,
                })
                .collect(),
            secondary_configured: status.secondary_configured,
            daily_secondary_limit: status.daily_secondary_limit,
            max_primary_attempts: status.max_primary_attempts,
            live_status: LIVE_STATUS_PATH,
        }
    }
}

/// Print the configured key slots. Full key values are never shown.
pub fn keys(state: &AppState, json: bool) -> Result<()> {
    let configured = ConfiguredKeys::from(state.router.system_status().redacted());

    if json {
        println!("{}", serde_json::to_string_pretty(&configured)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("Configured Primary Key Slots").bold());
    println!();

    if configured.primary_slots.is_empty() {
        println!(
            "  {} No primary keys configured. Set {} .. {} or {}.",
            style("i").blue().bold(),
            style("OPENROUTER_API_KEY_1").cyan(),
            style("OPENROUTER_API_KEY_5").cyan(),
            style("OPENROUTER_API_KEY").cyan()
        );
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Slot").fg(Color::White),
            Cell::new("Key").fg(Color::White),
        ]);

        for slot in &configured.primary_slots {
            table.add_row(vec![Cell::new(&slot.slot), Cell::new(&slot.masked_key)]);
        }

        println!("{table}");
    }

    println!();
    println!(
        "  Fallback:  {}",
        if configured.secondary_configured {
            style("configured".to_string()).green()
        } else {
            style("not configured (OPENAI_API_KEY unset)".to_string()).yellow()
        }
    );
    println!(
        "  Daily fallback limit: {}",
        style(configured.daily_secondary_limit).bold()
    );
    println!();
    println!(
        "  {}",
        style(format!(
            "Locks and cooldowns live in the server. Query GET {} for live key state.",
            configured.live_status
        ))
        .dim()
    );
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{test_state, KEY_VALUE};

    #[tokio::test]
    async fn test_configured_keys_omit_runtime_state() {
        let state = test_state(Ok("ok")).await;
        state.router.lock_key("OPENROUTER_API_KEY_1").unwrap();

        let configured = ConfiguredKeys::from(state.router.system_status().redacted());
        assert_eq!(configured.primary_slots.len(), 1);
        assert_eq!(configured.primary_slots[0].slot, "OPENROUTER_API_KEY_1");
        assert_eq!(configured.primary_slots[0].masked_key, "...9f3a");
        assert!(!configured.secondary_configured);
        assert_eq!(configured.live_status, "/api/v1/admin/ai/status");

        let value = serde_json::to_value(&configured).unwrap();
        let slot = &value["primary_slots"][0];
        assert!(slot.get("manually_disabled").is_none());
        assert!(slot.get("usage_count").is_none());
        assert!(!value.to_string().contains(KEY_VALUE));
    }
}
