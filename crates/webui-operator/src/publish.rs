//! Publishes the WebUI port as a Kubernetes `Service`.
//!
//! Registration happens once at startup via server-side apply, so repeated
//! operator restarts converge on the same object.

use anyhow::Context;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use tracing::info;
use webui_core::publisher::ServiceExposure;

pub const FIELD_MANAGER: &str = "free5gc-webui-operator";

/// Build the `Service` object for `exposure` in `namespace`.
pub fn service_manifest(exposure: &ServiceExposure, namespace: &str) -> Service {
    let ports = exposure
        .ports
        .iter()
        .map(|p| ServicePort {
            name: Some(p.name.clone()),
            port: i32::from(p.port),
            target_port: Some(IntOrString::Int(i32::from(p.port))),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        })
        .collect();

    Service {
        metadata: ObjectMeta {
            name: Some(exposure.app.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(exposure.selector()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some(exposure.service_type.clone()),
            selector: Some(exposure.selector()),
            ports: Some(ports),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub struct KubeServicePatch {
    client: Client,
    namespace: String,
}

impl KubeServicePatch {
    /// Connect using in-cluster config or the local kubeconfig.
    pub async fn connect(namespace: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::try_default()
            .await
            .context("failed to build kubernetes client")?;
        Ok(Self {
            client,
            namespace: namespace.into(),
        })
    }

    pub async fn publish(&self, exposure: &ServiceExposure) -> anyhow::Result<()> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), &self.namespace);
        let manifest = service_manifest(exposure, &self.namespace);
        let params = PatchParams::apply(FIELD_MANAGER).force();
        api.patch(&exposure.app, &params, &Patch::Apply(&manifest))
            .await
            .with_context(|| {
                format!(
                    "failed to apply service {}/{}",
                    self.namespace, exposure.app
                )
            })?;
        info!(
            namespace = %self.namespace,
            service = %exposure.app,
            service_type = %exposure.service_type,
            "service published"
        );
        Ok(())
    }
}
