use thiserror::Error;

/// Everything a dispatched command can fail with
///
/// The `Display` output is what ends up in front of the user, so keep it short.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed argument or resource URI. Never reaches the cluster.
    #[error("{0}")]
    Validation(String),
    #[error("cluster unavailable: {0:#}")]
    ClusterUnavailable(anyhow::Error),
    #[error("chat delivery failed: {0:#}")]
    ChatDelivery(anyhow::Error),
}

impl Error {
    pub fn required(argument: &str) -> Error {
        Error::Validation(format!("{argument} is required"))
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::ClusterUnavailable(_) => "cluster_unavailable",
            Error::ChatDelivery(_) => "chat_delivery",
        }
    }
}

#[test]
fn required_argument_message() {
    assert_eq!(Error::required("pod_name").to_string(), "pod_name is required");
}
