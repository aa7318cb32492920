use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

use crate::broker::ServiceBroker;
use crate::config::{build_tls_acceptor, GatewayConfig};
use crate::errors::{GatewayError, Result};
use crate::routing::RouteTable;
use crate::server::assets::AssetServer;
use crate::server::listener::{run_http_server, run_tls_server};
use crate::server::pipeline::{build_router, GatewayState};

/// How long [`GatewayHandle::stop`] waits for in-flight requests to drain
/// before aborting the serve task.
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// The gateway service facade.
///
/// Construction validates the configuration, compiles the route table, and
/// prepares TLS material; [`Gateway::start`] binds the listener and returns a
/// [`GatewayHandle`] for the running instance.
pub struct Gateway {
    config: GatewayConfig,
    table: Arc<RouteTable>,
    broker: Arc<dyn ServiceBroker>,
    acceptor: Option<TlsAcceptor>,
}

impl Gateway {
    pub fn new(config: GatewayConfig, broker: Arc<dyn ServiceBroker>) -> Result<Self> {
        config.validate()?;
        let table = Arc::new(RouteTable::from_config(&config)?);
        let acceptor = match &config.https {
            Some(https) => Some(build_tls_acceptor(https)?),
            None => None,
        };

        info!(
            mounts = table.mounts.len(),
            assets = config.assets.is_some(),
            https = acceptor.is_some(),
            "Gateway created"
        );

        Ok(Self { config, table, broker, acceptor })
    }

    /// True iff TLS material was configured and loaded.
    pub fn is_https(&self) -> bool {
        self.acceptor.is_some()
    }

    /// Bind the listening socket and serve until the handle is stopped.
    pub async fn start(self) -> Result<GatewayHandle> {
        let addr: SocketAddr = format!("{}:{}", self.config.ip, self.config.port)
            .parse()
            .map_err(|e| GatewayError::config(format!("Invalid listener address: {}", e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::transport(format!("Failed to bind gateway: {}", e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::transport(format!("Failed to read local addr: {}", e)))?;

        let state = GatewayState {
            table: self.table,
            broker: self.broker,
            assets: self.config.assets.as_ref().map(|cfg| Arc::new(AssetServer::new(cfg))),
            request_timeout: self.config.request_timeout_ms.map(Duration::from_millis),
        };
        let router = build_router(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };

        let is_https = self.acceptor.is_some();
        let task = match self.acceptor {
            Some(acceptor) => tokio::spawn(run_tls_server(listener, acceptor, router, shutdown)),
            None => tokio::spawn(run_http_server(listener, router, shutdown)),
        };

        info!(address = %local_addr, https = is_https, "Gateway listening");

        Ok(GatewayHandle { local_addr, is_https, shutdown: Some(shutdown_tx), task })
    }
}

/// Handle to a running gateway.
pub struct GatewayHandle {
    local_addr: SocketAddr,
    is_https: bool,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl GatewayHandle {
    /// The address the listener is bound to (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_https(&self) -> bool {
        self.is_https
    }

    /// Stop accepting connections and drain in-flight requests, aborting the
    /// serve task once the grace period elapses.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        match tokio::time::timeout(STOP_GRACE_PERIOD, &mut self.task).await {
            Ok(joined) => joined
                .map_err(|e| GatewayError::internal(format!("Gateway task failed: {}", e)))?,
            Err(_) => {
                warn!(grace_secs = STOP_GRACE_PERIOD.as_secs(), "Drain grace period elapsed");
                self.task.abort();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{ActionResult, BrokerError, Params};
    use async_trait::async_trait;

    struct NullBroker;

    #[async_trait]
    impl ServiceBroker for NullBroker {
        async fn invoke(&self, _action: &str, _params: Params) -> std::result::Result<ActionResult, BrokerError> {
            Ok(ActionResult::Null)
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = GatewayConfig { request_timeout_ms: Some(0), ..Default::default() };
        assert!(Gateway::new(config, Arc::new(NullBroker)).is_err());
    }

    #[test]
    fn test_plain_config_is_not_https() {
        let gateway = Gateway::new(GatewayConfig::default(), Arc::new(NullBroker)).unwrap();
        assert!(!gateway.is_https());
    }

    #[tokio::test]
    async fn test_start_binds_ephemeral_port_and_stops() {
        let config = GatewayConfig { port: 0, ..Default::default() };
        let gateway = Gateway::new(config, Arc::new(NullBroker)).unwrap();
        let handle = gateway.start().await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        handle.stop().await.unwrap();
    }
}
