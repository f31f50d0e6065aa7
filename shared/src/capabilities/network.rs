use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Synchronous reachability query against the OS connectivity service.
#[derive(Clone)]
pub struct Network<E> {
    context: CapabilityContext<NetworkOperation, E>,
}

impl<Ev> Capability<Ev> for Network<Ev> {
    type Operation = NetworkOperation;
    type MappedSelf<MappedEv> = Network<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Network::new(self.context.map_event(f))
    }
}

impl<E> Network<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<NetworkOperation, E>) -> Self {
        Self { context }
    }

    pub fn check_connectivity<F>(&self, callback: F)
    where
        F: FnOnce(NetworkResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(NetworkOperation::CheckConnectivity)
                .await;
            context.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetworkOperation {
    CheckConnectivity,
}

impl Operation for NetworkOperation {
    type Output = NetworkResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetworkOutput {
    /// An active network exists and reports itself connected.
    Connected,
    Disconnected,
}

impl NetworkOutput {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl From<bool> for NetworkOutput {
    fn from(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetworkError {
    #[error("connectivity service unavailable")]
    ServiceUnavailable,
}

pub type NetworkResult = Result<NetworkOutput, NetworkError>;
