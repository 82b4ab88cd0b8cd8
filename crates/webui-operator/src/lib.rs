//! Host side of the free5gc WebUI operator: the event loop that feeds the
//! reconciler, the process supervisor behind the container, and the
//! Kubernetes service publisher.

pub mod host;
pub mod process;
pub mod publish;

pub use host::Host;
pub use process::ProcessManager;
pub use publish::KubeServicePatch;
