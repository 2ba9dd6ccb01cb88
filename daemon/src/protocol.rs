//! IPC protocol definitions (JSON messages)

use crate::analysis::AnalysisItem;
use crate::db::MetricSample;
use crate::disk::StrategyKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    Ping,
    LiveMetrics,
    History {
        #[serde(default)]
        params: HistoryParams,
    },
    ScanDisk {
        #[serde(default)]
        params: ScanDiskParams,
    },
    SearchDisk { params: SearchDiskParams },
    TopProcesses {
        #[serde(default)]
        params: TopProcessesParams,
    },
    ListServices,
    AnalysisPrompt { params: AnalysisItem },
    Analyze { params: AnalysisItem },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryParams {
    pub hours: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanDiskParams {
    pub path: Option<String>,
    pub top_n: Option<usize>,
    pub strategy: Option<StrategyKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDiskParams {
    pub query: String,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopProcessesParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    Response {
        id: Option<String>,
        data: serde_json::Value,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    Sample { data: MetricSample },
}

impl Response {
    pub fn data(data: serde_json::Value) -> Self {
        Response::Response { id: None, data }
    }

    pub fn error(error: impl Into<String>, details: Option<String>) -> Self {
        Response::Error {
            error: error.into(),
            details,
        }
    }
}

#[async_trait::async_trait]
pub trait RequestHandler {
    async fn handle(&self, request: Request) -> Response;
}
