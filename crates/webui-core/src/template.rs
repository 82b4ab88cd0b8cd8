//! Config rendering.
//!
//! Templates ship inside the binary (`crates/webui-core/templates/`). The
//! syntax is deliberately tiny: `{{ name }}` placeholders filled from the
//! params map. A single trailing newline is dropped from the output, the same
//! way Jinja renders by default.

use crate::error::{OperatorError, Result};
use rust_embed::Embed;
use std::collections::BTreeMap;

pub type TemplateParams = BTreeMap<String, String>;

#[derive(Embed)]
#[folder = "templates/"]
struct BundledTemplates;

/// Renders a named template to text. Must be deterministic: equal inputs
/// give byte-identical output.
pub trait ConfigWriter {
    fn render(&self, template: &str, params: &TemplateParams) -> Result<String>;
}

/// [`ConfigWriter`] over the bundled templates, plus any registered inline.
#[derive(Debug, Clone, Default)]
pub struct TemplateWriter {
    inline: BTreeMap<String, String>,
}

impl TemplateWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or shadow) a template by name.
    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.inline.insert(name.into(), source.into());
        self
    }

    fn source(&self, name: &str) -> Result<String> {
        if let Some(src) = self.inline.get(name) {
            return Ok(src.clone());
        }
        let file = <BundledTemplates as Embed>::get(name)
            .ok_or_else(|| OperatorError::TemplateNotFound(name.to_string()))?;
        String::from_utf8(file.data.into_owned())
            .map_err(|_| OperatorError::InvalidTemplate(name.to_string()))
    }
}

impl ConfigWriter for TemplateWriter {
    fn render(&self, template: &str, params: &TemplateParams) -> Result<String> {
        let source = self.source(template)?;
        let mut out = substitute(template, &source, params)?;
        if out.ends_with('\n') {
            out.pop();
            if out.ends_with('\r') {
                out.pop();
            }
        }
        Ok(out)
    }
}

fn substitute(template: &str, source: &str, params: &TemplateParams) -> Result<String> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(OperatorError::InvalidTemplate(template.to_string()));
        };
        let key = after[..end].trim();
        let value = params
            .get(key)
            .ok_or_else(|| OperatorError::MissingTemplateParam {
                template: template.to_string(),
                param: key.to_string(),
            })?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::CONFIG_TEMPLATE;

    const EXPECTED_WEBUICFG: &str = "info:\n  version: 1.0.0\n  description: WEBUI initial local configuration\n\nconfiguration:\n  mongodb:\n    name: free5gc\n    url: mongodb://mongodb:27017\n\nlogger:\n  WEBUI:\n    ReportCaller: false\n    debugLevel: info";

    #[test]
    fn bundled_webuicfg_renders_exactly() {
        let out = TemplateWriter::new()
            .render(CONFIG_TEMPLATE, &TemplateParams::new())
            .unwrap();
        assert_eq!(out, EXPECTED_WEBUICFG);
    }

    #[test]
    fn rendering_is_deterministic() {
        let writer = TemplateWriter::new();
        let a = writer.render(CONFIG_TEMPLATE, &TemplateParams::new()).unwrap();
        let b = writer.render(CONFIG_TEMPLATE, &TemplateParams::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rendered_config_is_valid_yaml() {
        let out = TemplateWriter::new()
            .render(CONFIG_TEMPLATE, &TemplateParams::new())
            .unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(doc["configuration"]["mongodb"]["name"], "free5gc");
        assert_eq!(doc["logger"]["WEBUI"]["debugLevel"], "info");
    }

    #[test]
    fn substitutes_params() {
        let writer = TemplateWriter::new().with_template("t", "url: {{ url }}\nname: {{name}}\n");
        let params = TemplateParams::from([
            ("url".to_string(), "mongodb://db:27017".to_string()),
            ("name".to_string(), "free5gc".to_string()),
        ]);
        assert_eq!(
            writer.render("t", &params).unwrap(),
            "url: mongodb://db:27017\nname: free5gc"
        );
    }

    #[test]
    fn missing_param_is_an_error() {
        let writer = TemplateWriter::new().with_template("t", "url: {{ url }}");
        let err = writer.render("t", &TemplateParams::new()).unwrap_err();
        assert!(matches!(
            err,
            OperatorError::MissingTemplateParam { ref param, .. } if param == "url"
        ));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let err = TemplateWriter::new()
            .render("nope.j2", &TemplateParams::new())
            .unwrap_err();
        assert!(matches!(err, OperatorError::TemplateNotFound(_)));
    }
}
