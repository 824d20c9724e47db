mod env;

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::prelude::*;

use vp_relay::{DEFAULT_PORTS, RelayConfig, lan_ipv4_addrs, router};

fn main() -> io::Result<()> {
    let env = env::load().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let _guard = sentry::init(sentry::ClientOptions {
        dsn: env.sentry_dsn.as_ref().and_then(|s| s.parse().ok()),
        release: sentry::release_name!(),
        environment: Some(
            if cfg!(debug_assertions) {
                "development"
            } else {
                "production"
            }
            .into(),
        ),
        attach_stacktrace: true,
        ..Default::default()
    });

    sentry::configure_scope(|scope| {
        scope.set_tag("service", "vp-relay");
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sentry::integrations::tracing::layer())
        .init();

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(env.port));

    if let Err(e) = &result {
        tracing::error!(error = %e, "server_failed");
    }

    if let Some(client) = sentry::Hub::current().client() {
        client.close(Some(Duration::from_secs(2)));
    }

    result
}

async fn serve(port: Option<u16>) -> io::Result<()> {
    let listener = bind(port).await?;
    let addr = listener.local_addr()?;
    tracing::info!(addr = %addr, "server_listening");

    for ip in lan_ipv4_addrs() {
        tracing::info!(url = %format!("http://{ip}:{}", addr.port()), "lan_address");
    }

    axum::serve(listener, router(RelayConfig::default()))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Bind the requested port, or the first free one from [`DEFAULT_PORTS`].
async fn bind(port: Option<u16>) -> io::Result<TcpListener> {
    if let Some(port) = port {
        return TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await;
    }

    let mut last_error = None;
    for port in DEFAULT_PORTS {
        match TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await {
            Ok(listener) => return Ok(listener),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied
                ) =>
            {
                tracing::warn!(port, error = %e, "port_unavailable");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| io::Error::new(io::ErrorKind::AddrInUse, "no port available")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl_c_handler_failed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown_signal_received");
}
