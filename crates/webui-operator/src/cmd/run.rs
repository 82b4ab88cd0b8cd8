use anyhow::Context;
use std::future::Future;
use std::path::Path;
use tracing::{info, warn};
use webui_core::config::WarnLevel;
use webui_core::container::LocalContainer;
use webui_core::publisher::ServiceExposure;
use webui_core::reconciler::Reconciler;
use webui_core::supervisor::{ProcessSupervisor, RecordingSupervisor};
use webui_core::template::TemplateWriter;
use webui_operator::{Host, KubeServicePatch, ProcessManager};

pub struct RunOptions {
    pub namespace: String,
    pub app: Option<String>,
    pub publish: bool,
    pub dry_run: bool,
}

pub fn run(root: &Path, config_path: Option<&Path>, opts: RunOptions) -> anyhow::Result<()> {
    // config and ready marker would land under root while the webconsole
    // itself still runs on the host filesystem
    if !opts.dry_run && root != Path::new("/") {
        anyhow::bail!(
            "--root {} requires --dry-run: supervised processes run against /",
            root.display()
        );
    }

    let config = super::load_config(config_path)?;
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => warn!("config: {}", w.message),
            WarnLevel::Error => anyhow::bail!("invalid config: {}", w.message),
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        if opts.publish {
            let app = opts
                .app
                .clone()
                .unwrap_or_else(|| config.service_name.clone());
            let exposure = ServiceExposure::from_config(app, &config);
            let namespace = opts.namespace.clone();
            // fire-and-forget: reconciliation never waits on publication
            tokio::spawn(async move {
                if let Err(e) = publish(namespace, exposure).await {
                    warn!("service publication failed: {e:#}");
                }
            });
        } else {
            info!("service publication disabled");
        }

        if opts.dry_run {
            drive(root, config, RecordingSupervisor::new()).await
        } else {
            let supervisor = ProcessManager::new(root).with_stop_timeout(config.stop_timeout());
            drive(root, config, supervisor).await
        }
    })
}

async fn publish(namespace: String, exposure: ServiceExposure) -> anyhow::Result<()> {
    KubeServicePatch::connect(namespace)
        .await?
        .publish(&exposure)
        .await
}

async fn drive<S: ProcessSupervisor>(
    root: &Path,
    config: webui_core::config::OperatorConfig,
    supervisor: S,
) -> anyhow::Result<()> {
    let span = tracing::info_span!("reconciler", service = %config.service_name);
    let container =
        LocalContainer::new(root, supervisor).with_ready_marker(config.ready_marker.clone());
    let reconciler = Reconciler::new(container, TemplateWriter::new(), config, span);

    let status = Host::new(reconciler)
        .run(until_signal(tokio::signal::ctrl_c()))
        .await
        .context("reconciliation failed")?;
    info!(%status, "exiting");
    Ok(())
}

/// Resolves when `signal` fires. If the listener cannot be installed the
/// operator keeps running instead of treating that as a shutdown request.
async fn until_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("cannot listen for shutdown signal, running until killed: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_resolves_shutdown() {
        let done = tokio::time::timeout(Duration::from_millis(200), until_signal(async { Ok(()) }));
        assert!(done.await.is_ok());
    }

    #[tokio::test]
    async fn signal_listener_error_is_not_a_shutdown() {
        let done = tokio::time::timeout(
            Duration::from_millis(200),
            until_signal(async { Err(std::io::Error::other("no signal handler")) }),
        );
        assert!(done.await.is_err());
    }
}
