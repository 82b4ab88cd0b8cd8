use std::path::Path;
use webui_core::template::{ConfigWriter, TemplateWriter};

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let content = TemplateWriter::new().render(&config.template, &config.template_params)?;
    println!("{content}");
    Ok(())
}
