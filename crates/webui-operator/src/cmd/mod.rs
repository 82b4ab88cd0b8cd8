pub mod config;
pub mod plan;
pub mod render;
pub mod run;

use anyhow::Context;
use std::path::Path;
use webui_core::config::OperatorConfig;

pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<OperatorConfig> {
    OperatorConfig::load_or_default(path).with_context(|| match path {
        Some(p) => format!("failed to load config {}", p.display()),
        None => "failed to load config".to_string(),
    })
}
