//! Pipeline definition schema.
//!
//! Structs mapping the YAML pipeline file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::StepLink;

/// Root of a pipeline file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pipeline name, used as the report suite name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Environment passed to every command step.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Parameter values known up front.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub parameters: HashMap<String, String>,

    /// Steps in declaration order.
    pub steps: Vec<StepConfig>,
}

/// One command step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Target name.
    pub name: String,

    /// Human description. Defaults to the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Shell command to run.
    pub command: String,

    /// Capabilities that must exist first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<LinkConfig>,

    /// Capabilities established on success.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub creates: Vec<LinkConfig>,

    /// Deferred parameters exported into the command's environment.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,

    /// Parameters this step supplies.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub provides: HashMap<String, ProvidedParameter>,

    /// Link guarding the provided parameters. Defaults to the first created link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provides_link: Option<LinkConfig>,

    /// Command whose zero exit means the step's effect already exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_check: Option<String>,

    /// Step-specific environment.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Where a provided parameter's value comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidedParameter {
    /// Literal value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// File (written by the step) holding the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// A capability link as written in YAML.
///
/// ```yaml
/// requires:
///   - kind: external_image
///     namespace: ocp
///     name: base
///     tag: "4.15"
///   - kind: internal_image
///     tag: src
///   - kind: rpm_repo
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkConfig {
    AllSteps,
    ExternalImage {
        namespace: String,
        name: String,
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    InternalImage {
        tag: String,
    },
    ImagesReady,
    RpmRepo,
    ReleaseImages,
}

impl From<&LinkConfig> for StepLink {
    fn from(config: &LinkConfig) -> Self {
        match config {
            LinkConfig::AllSteps => StepLink::AllSteps,
            LinkConfig::ExternalImage {
                namespace,
                name,
                tag,
                alias,
            } => StepLink::ExternalImage {
                namespace: namespace.clone(),
                name: name.clone(),
                tag: tag.clone(),
                alias: alias.clone(),
            },
            LinkConfig::InternalImage { tag } => StepLink::InternalImage(tag.clone()),
            LinkConfig::ImagesReady => StepLink::ImagesReady,
            LinkConfig::RpmRepo => StepLink::RpmRepo,
            LinkConfig::ReleaseImages => StepLink::ReleaseImages,
        }
    }
}
