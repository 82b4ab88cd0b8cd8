use crate::output::print_json;
use std::path::Path;
use webui_core::plan::{MergeMode, Plan};

/// The plan the reconciler would submit, built from the operator's layer
/// alone rather than merged onto whatever a running supervisor holds.
pub fn run(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let mut plan = Plan::default();
    plan.apply(&config.layer(), MergeMode::Fresh);

    if json {
        print_json(&plan)
    } else {
        print!("{}", plan.to_yaml()?);
        Ok(())
    }
}
