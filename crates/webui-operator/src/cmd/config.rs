use crate::output::{print_json, print_yaml};
use std::path::Path;
use webui_core::config::WarnLevel;

pub fn run(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "config": config,
            "warnings": warnings,
        });
        print_json(&value)?;
    } else {
        print_yaml(&config)?;
        if warnings.is_empty() {
            println!("# Config is valid. No warnings.");
        }
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("# [{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
