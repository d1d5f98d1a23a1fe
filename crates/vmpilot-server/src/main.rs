//! vmpilot: WebSocket server bridging a browser chat to a computer-use agent.
//!
//! Each connection becomes one session: a remote VM is provisioned after the
//! hello frame, the model drives it through tool calls, and the VM is
//! released when the session ends for any reason.

mod app;
mod cli;
mod connection;
mod credits;
mod protocol;
mod session;
mod table;
#[cfg(test)]
mod testing;
mod transport;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing_subscriber::EnvFilter;
use vmpilot_ai::{ClaudeClient, ClaudeConfig, Sampler};
use vmpilot_common::PilotError;
use vmpilot_config::schema::CreditBackend;
use vmpilot_config::{config_to_json, load_config, PilotConfig};
use vmpilot_instance::{HttpInstanceProvider, InstanceProvider};

use crate::app::AppContext;
use crate::connection::handle_connection;
use crate::credits::{CreditPolicy, CreditStore, MemoryCreditStore, SupabaseCreditStore};

/// Upper bound on waiting for sessions to release their instances at exit.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    let args = cli::parse();
    let loaded = load_config(args.config.as_deref().map(Path::new));

    let level = args
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().ok().map(|c| c.logging.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(filter_directives(level.as_deref()))),
        )
        .init();

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.server.port = u32::from(port);
    }
    if args.print_config {
        println!("{}", config_to_json(&config));
        return;
    }

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "vmpilot exited with an error");
        std::process::exit(1);
    }
}

/// Same level for the binary and the crates that log on its behalf.
fn filter_directives(level: Option<&str>) -> String {
    let level = level.unwrap_or("info");
    ["vmpilot", "vmpilot_ai", "vmpilot_instance", "vmpilot_config"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

async fn run(config: PilotConfig) -> Result<(), PilotError> {
    let claude = ClaudeConfig::from_env()?
        .with_max_tokens(config.agent.max_tokens)
        .with_thinking_budget(config.agent.thinking_budget)
        .with_request_timeout(Duration::from_secs(u64::from(
            config.sampling.request_timeout_secs,
        )));
    let sampler: Arc<dyn Sampler> = Arc::new(ClaudeClient::new(claude)?);
    let provider: Arc<dyn InstanceProvider> =
        Arc::new(HttpInstanceProvider::new(config.instance.api_url.clone())?);
    let credits = credit_policy(&config)?;

    let addr = config.server.bind_addr();
    let stats_interval = Duration::from_secs(u64::from(config.server.stats_interval_secs.max(1)));
    let ctx = AppContext::new(config, sampler, provider, credits);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        credits = ctx.credits.is_some(),
        "vmpilot listening"
    );

    spawn_stats(ctx.clone(), stats_interval);

    let shutdown = ctx.shutdown.clone();
    tokio::select! {
        _ = accept_loop(listener, ctx.clone()) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Signal handler failed; shutting down");
            }
        }
    }

    let open = ctx.table.cancel_all().await;
    tracing::info!(sessions = open, "Shutting down");
    shutdown.cancel();
    let remaining = ctx.table.drain(SHUTDOWN_DRAIN).await;
    if remaining > 0 {
        tracing::warn!(sessions = remaining, "Sessions still open at exit");
    }
    Ok(())
}

fn credit_policy(config: &PilotConfig) -> Result<Option<Arc<CreditPolicy>>, PilotError> {
    let store: Arc<dyn CreditStore> = match config.credits.backend {
        CreditBackend::Disabled => return Ok(None),
        CreditBackend::Memory => Arc::new(MemoryCreditStore::new(config.credits.accounts.clone())),
        CreditBackend::Supabase => Arc::new(SupabaseCreditStore::from_env()?),
    };
    tracing::info!(
        backend = ?config.credits.backend,
        policy = ?config.credits.policy,
        cost = config.credits.cost_per_turn,
        "Credit accounting enabled"
    );
    Ok(Some(Arc::new(CreditPolicy::from_config(&config.credits, store))))
}

async fn accept_loop(listener: TcpListener, ctx: AppContext) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, ctx).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}

fn spawn_stats(ctx: AppContext, every: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = ctx.shutdown.cancelled() => break,
                _ = tokio::time::sleep(every) => {}
            }
            let sessions = ctx.table.count().await;
            let instances = ctx.table.instance_count().await;
            let oldest_secs = ctx.table.oldest_age().await.map(|age| age.as_secs());
            tracing::info!(sessions, instances, oldest_secs, "Active sessions");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_covers_every_crate() {
        assert_eq!(
            filter_directives(Some("debug")),
            "vmpilot=debug,vmpilot_ai=debug,vmpilot_instance=debug,vmpilot_config=debug"
        );
        assert!(filter_directives(None).starts_with("vmpilot=info"));
    }

    #[test]
    fn disabled_credits_build_no_policy() {
        let config = PilotConfig::default();
        assert!(credit_policy(&config).unwrap().is_none());
    }

    #[test]
    fn memory_credits_build_a_policy() {
        let mut config = PilotConfig::default();
        config.credits.backend = CreditBackend::Memory;
        config.credits.accounts.insert("key-1".into(), 3.0);
        assert!(credit_policy(&config).unwrap().is_some());
    }
}
