use crate::error::{OperatorError, Result};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Workload constants
// ---------------------------------------------------------------------------

pub const SERVICE_NAME: &str = "free5gc-webui";
pub const BASE_CONFIG_PATH: &str = "/free5gc/config";
pub const CONFIG_FILE_NAME: &str = "webuicfg.yaml";
pub const CONFIG_TEMPLATE: &str = "webuicfg.yaml.j2";
pub const WEBCONSOLE_BIN: &str = "/free5gc/webconsole/webconsole";

/// Marker file (relative to the container root) whose presence means the
/// container accepts operations.
pub const READY_MARKER: &str = ".ready";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Absolute in-container path of the config artifact.
pub fn config_file_path(base: &str, file_name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file_name)
}

/// Map an absolute in-container path onto the host directory `root`.
///
/// Rejects relative paths and any `..` component so a write can never land
/// outside `root`.
pub fn host_path(root: &Path, container_path: &str) -> Result<PathBuf> {
    let path = Path::new(container_path);
    if !path.is_absolute() {
        return Err(OperatorError::InvalidPath(container_path.to_string()));
    }
    let mut out = root.to_path_buf();
    for component in path.components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(part) => out.push(part),
            Component::ParentDir | Component::Prefix(_) => {
                return Err(OperatorError::InvalidPath(container_path.to_string()));
            }
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
