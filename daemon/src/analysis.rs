//! Prompt building for the optional text-generation collaborator

use crate::collector::ProcessSnapshot;
use crate::error::AnalysisError;
use crate::services::ServiceRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Something the user asked to have explained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisItem {
    Process(ProcessSnapshot),
    Service(ServiceRecord),
    Disk { path: String, size: String },
}

/// External text generator (an LLM API client or similar).
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AnalysisError>;
}

pub fn os_family() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        other => other,
    }
}

pub fn build_prompt(item: &AnalysisItem, os: &str) -> String {
    let subject = match item {
        AnalysisItem::Process(p) => format!(
            "the process '{}' (PID {}, user {}) currently using {:.1}% CPU and {:.1}% memory",
            p.name, p.pid, p.username, p.cpu_percent, p.memory_percent
        ),
        AnalysisItem::Service(s) => format!(
            "the service '{}' ({}), load state {}, active state {}, sub state {}",
            s.unit, s.description, s.load, s.active, s.sub
        ),
        AnalysisItem::Disk { path, size } => {
            format!("the file or directory '{}' taking {} of disk space", path, size)
        }
    };
    format!(
        "On a {os} system, explain in a few sentences what {subject} is, \
         whether this looks normal, and whether it is safe to stop or remove."
    )
}

/// Holds the generator when credentials were configured at startup.
#[derive(Clone, Default)]
pub struct Analyzer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Analyzer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn disabled() -> Self {
        Self { generator: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn analyze(&self, item: &AnalysisItem) -> Result<String, AnalysisError> {
        let generator = self.generator.as_ref().ok_or(AnalysisError::Disabled)?;
        generator.generate(&build_prompt(item, os_family())).await
    }
}
