//! Instance bootstrap metadata (`AWS::CloudFormation::Init`).
//!
//! Opaque to the generator; the cfn-init agent on the instance interprets it
//! at boot. File contents routinely embed reference expressions that the
//! platform substitutes before the agent ever sees them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::intrinsics::Value;

/// Resource-level metadata carrying a cfn-init descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    #[serde(rename = "AWS::CloudFormation::Init")]
    init: Init,
}

impl Metadata {
    pub fn init(config: InitConfig) -> Self {
        Self {
            init: Init { config },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Init {
    config: InitConfig,
}

/// One bootstrap config set: ordered commands, file writes, and service
/// enablement. Command keys carry numeric prefixes because cfn-init runs
/// them in lexical order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitConfig {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    commands: BTreeMap<String, InitCommand>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    files: BTreeMap<String, InitFile>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    services: BTreeMap<String, InitService>,
}

impl InitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, name: impl Into<String>, command: Value) -> Self {
        self.commands.insert(name.into(), InitCommand { command });
        self
    }

    pub fn file(mut self, path: impl Into<String>, file: InitFile) -> Self {
        self.files.insert(path.into(), file);
        self
    }

    pub fn service(mut self, name: impl Into<String>, service: InitService) -> Self {
        self.services.insert(name.into(), service);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
struct InitCommand {
    command: Value,
}

/// A file written during bootstrap: octal mode string, ownership, and
/// content rendered from literals and reference expressions.
#[derive(Debug, Clone, Serialize)]
pub struct InitFile {
    content: Value,
    group: String,
    mode: String,
    owner: String,
}

impl InitFile {
    pub fn new(mode: &str, owner: &str, group: &str, content: Value) -> Self {
        Self {
            content,
            group: group.to_string(),
            mode: mode.to_string(),
            owner: owner.to_string(),
        }
    }
}

/// A service the bootstrap agent enables and keeps running, restarted when
/// any of the listed files change.
#[derive(Debug, Clone, Serialize)]
pub struct InitService {
    enabled: String,

    #[serde(rename = "ensureRunning")]
    ensure_running: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<String>,
}

impl InitService {
    pub fn enabled<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: "true".to_string(),
            ensure_running: "true".to_string(),
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}
