//! Request dispatch: maps protocol requests onto the monitoring core

use crate::analysis::{build_prompt, os_family, Analyzer};
use crate::collector::{top_processes, ProcessCollector};
use crate::config::Config;
use crate::db::MetricsStore;
use crate::disk::{resolve_root, strategy_for};
use crate::protocol::{Request, RequestHandler, Response};
use crate::sampler::{HostCounters, MetricsSampler};
use crate::search::search_async;
use crate::services::list_services;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SERVICE_LIST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Dashboard<C: HostCounters + 'static> {
    pub config: Config,
    pub store: Arc<MetricsStore>,
    pub sampler: Arc<Mutex<MetricsSampler<C>>>,
    pub processes: Arc<dyn ProcessCollector>,
    pub analyzer: Analyzer,
}

fn failure(error: &str, cause: impl Display) -> Response {
    warn!("{}: {}", error, cause);
    Response::error(error, Some(cause.to_string()))
}

fn to_value<T: serde::Serialize>(value: &T) -> Response {
    match serde_json::to_value(value) {
        Ok(data) => Response::data(data),
        Err(e) => failure("Failed to encode response", e),
    }
}

#[async_trait::async_trait]
impl<C: HostCounters + 'static> RequestHandler for Dashboard<C> {
    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::LiveMetrics => {
                let sampler = Arc::clone(&self.sampler);
                let result = tokio::task::spawn_blocking(move || {
                    let mut sampler = sampler.lock().unwrap_or_else(|p| p.into_inner());
                    sampler.snapshot()
                })
                .await;
                match result {
                    Ok(Ok(live)) => to_value(&live),
                    Ok(Err(e)) => failure("Failed to sample system metrics", e),
                    Err(e) => failure("Failed to sample system metrics", e),
                }
            }

            Request::History { params } => {
                let hours = params.hours.unwrap_or(self.config.general.history_hours);
                match self.store.recent(hours) {
                    Ok(samples) => to_value(&samples),
                    Err(e) => failure("Failed to read metrics history", e),
                }
            }

            Request::ScanDisk { params } => {
                let root = resolve_root(params.path.as_deref(), &self.config.disk.root());
                let top_n = params.top_n.unwrap_or(self.config.disk.top_n);
                let kind = params.strategy.unwrap_or(self.config.disk.strategy);
                let strategy = strategy_for(kind, self.config.disk.scan_timeout());
                match strategy.scan(&root, top_n).await {
                    Ok(entries) => {
                        let data: Vec<_> = entries.iter().map(|e| e.to_json()).collect();
                        Response::data(serde_json::json!(data))
                    }
                    Err(e) => {
                        warn!("{} scan of {:?} failed: {}", strategy.name(), root, e);
                        Response::error(format!("Disk scan failed: {}", e), e.details())
                    }
                }
            }

            Request::SearchDisk { params } => {
                let root = resolve_root(params.path.as_deref(), &self.config.disk.root());
                match search_async(params.query, root, self.config.disk.search_cap).await {
                    Ok(paths) => {
                        let data: Vec<_> = paths.iter().map(|p| p.display().to_string()).collect();
                        Response::data(serde_json::json!(data))
                    }
                    Err(e) => failure("Search failed", e),
                }
            }

            Request::TopProcesses { params } => {
                let limit = params.limit.unwrap_or(self.config.processes.limit);
                let window = Duration::from_millis(self.config.processes.cpu_window_ms);
                let collector = Arc::clone(&self.processes);
                match tokio::task::spawn_blocking(move || {
                    top_processes(collector.as_ref(), limit, window)
                })
                .await
                {
                    Ok(processes) => to_value(&processes),
                    Err(e) => failure("Failed to list processes", e),
                }
            }

            Request::ListServices => match list_services(SERVICE_LIST_TIMEOUT).await {
                Ok(services) => to_value(&services),
                Err(e) => failure("Failed to list services", e),
            },

            Request::AnalysisPrompt { params } => Response::data(serde_json::json!({
                "os": os_family(),
                "prompt": build_prompt(&params, os_family()),
                "enabled": self.analyzer.is_enabled(),
            })),

            Request::Analyze { params } => match self.analyzer.analyze(&params).await {
                Ok(text) => Response::data(serde_json::json!({ "analysis": text })),
                Err(e) => failure("Analysis unavailable", e),
            },
        }
    }
}
