use kube::config::{Kubeconfig, KubeconfigError};
use tracing::{info, warn};

use crate::snapshot::ContextInfo;

pub const IN_CLUSTER: &str = "in-cluster";
const UNKNOWN_CLUSTER: &str = "unknown";
const DEFAULT_NAMESPACE: &str = "default";

/// Read-only view of the local kubeconfig contexts
///
/// Resolved once at startup. When no kubeconfig can be read we assume we run inside a pod.
#[derive(Debug, Clone)]
pub struct ContextRegistry {
    active: ContextInfo,
    available: Vec<ContextInfo>,
}

impl ContextRegistry {
    /// Discover contexts the way kubectl does (`KUBECONFIG`, then `~/.kube/config`)
    pub fn discover() -> ContextRegistry {
        ContextRegistry::from_read_result(Kubeconfig::read())
    }

    fn from_read_result(read: Result<Kubeconfig, KubeconfigError>) -> ContextRegistry {
        match read {
            Ok(kubeconfig) => ContextRegistry::from_kubeconfig(kubeconfig),
            // any failure at all means in-cluster, there's no finer distinction to make here
            Err(err) => {
                warn!("no usable kubeconfig ({err}), assuming in-cluster execution");
                ContextRegistry::in_cluster()
            }
        }
    }

    pub fn from_kubeconfig(kubeconfig: Kubeconfig) -> ContextRegistry {
        let available: Vec<ContextInfo> = kubeconfig
            .contexts
            .iter()
            .map(|named| {
                let context = named.context.as_ref();
                ContextInfo {
                    name: named.name.clone(),
                    cluster: context
                        .map(|c| c.cluster.clone())
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| UNKNOWN_CLUSTER.into()),
                    namespace: context
                        .and_then(|c| c.namespace.clone())
                        .unwrap_or_else(|| DEFAULT_NAMESPACE.into()),
                }
            })
            .collect();

        let current = kubeconfig.current_context.unwrap_or_default();
        let active = available
            .iter()
            .find(|c| c.name == current)
            .cloned()
            .unwrap_or_else(|| ContextInfo {
                name: current,
                cluster: UNKNOWN_CLUSTER.into(),
                namespace: DEFAULT_NAMESPACE.into(),
            });

        info!("active kubernetes context: {} ({} known)", active.name, available.len());
        ContextRegistry { active, available }
    }

    /// The synthetic single-entry registry used inside a pod
    pub fn in_cluster() -> ContextRegistry {
        let context = ContextInfo {
            name: IN_CLUSTER.into(),
            cluster: UNKNOWN_CLUSTER.into(),
            namespace: DEFAULT_NAMESPACE.into(),
        };
        ContextRegistry {
            active: context.clone(),
            available: vec![context],
        }
    }

    pub fn active_context(&self) -> ContextInfo {
        self.active.clone()
    }

    pub fn available_contexts(&self) -> Vec<ContextInfo> {
        self.available.clone()
    }
}
