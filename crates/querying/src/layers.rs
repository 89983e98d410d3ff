//! Architectural layer classification for flow graphs.
//!
//! Rules come from the optional `[layers]` table of `ckg.toml` at the project root:
//!
//! ```toml
//! [layers.annotations]
//! CONTROLLER = ["RestController", "Controller"]
//!
//! [layers.suffixes]
//! SERVICE = ["Service", "UseCase"]
//!
//! [layers.packages]
//! REPOSITORY = ["repository", "dao"]
//! ```
//!
//! Tables left out keep their defaults.

use database::graph::{CodeNode, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, warn};
use ts_rs::TS;

pub const PROJECT_CONFIG_FILE: &str = "ckg.toml";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[ts(export, export_to = "api.ts")]
pub enum Layer {
    Controller,
    Service,
    Repository,
    Component,
    Model,
    Other,
}

type RuleTable = BTreeMap<Layer, Vec<String>>;

fn table(entries: &[(Layer, &[&str])]) -> RuleTable {
    entries
        .iter()
        .map(|(layer, values)| (*layer, values.iter().map(|v| v.to_string()).collect()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerRules {
    pub annotations: RuleTable,
    /// Type name suffixes, matched case-sensitively
    pub suffixes: RuleTable,
    /// Package or directory segments, matched case-insensitively
    pub packages: RuleTable,
}

impl Default for LayerRules {
    fn default() -> Self {
        Self {
            annotations: table(&[
                (Layer::Controller, &["Controller", "RestController", "RequestMapping"]),
                (Layer::Service, &["Service"]),
                (Layer::Repository, &["Repository"]),
                (Layer::Component, &["Component", "Injectable"]),
                (Layer::Model, &["Entity", "Table", "Document", "Embeddable"]),
            ]),
            suffixes: table(&[
                (Layer::Controller, &["Controller", "Resource", "Handler"]),
                (Layer::Service, &["Service", "ServiceImpl", "Manager"]),
                (Layer::Repository, &["Repository", "Dao", "Store"]),
                (Layer::Component, &["Component"]),
                (Layer::Model, &["Entity", "Model", "Dto", "Record"]),
            ]),
            packages: table(&[
                (Layer::Controller, &["controller", "controllers", "web", "api"]),
                (Layer::Service, &["service", "services"]),
                (Layer::Repository, &["repository", "repositories", "dao", "persistence"]),
                (Layer::Component, &["component", "components"]),
                (Layer::Model, &["model", "models", "entity", "entities", "domain", "dto"]),
            ]),
        }
    }
}

type RawTable = BTreeMap<String, Vec<String>>;

#[derive(Debug, Default, Deserialize)]
struct RawLayerRules {
    annotations: Option<RawTable>,
    suffixes: Option<RawTable>,
    packages: Option<RawTable>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectConfig {
    #[serde(default)]
    layers: RawLayerRules,
}

fn convert(raw: Option<RawTable>, default: RuleTable) -> anyhow::Result<RuleTable> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    raw.into_iter()
        .map(|(name, values)| {
            Layer::from_str(&name)
                .map(|layer| (layer, values))
                .map_err(|_| anyhow::anyhow!("unknown layer '{name}'"))
        })
        .collect()
}

impl LayerRules {
    /// Parse the `[layers]` table out of a `ckg.toml` document
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let raw = toml::from_str::<ProjectConfig>(content)?.layers;
        let defaults = Self::default();
        Ok(Self {
            annotations: convert(raw.annotations, defaults.annotations)?,
            suffixes: convert(raw.suffixes, defaults.suffixes)?,
            packages: convert(raw.packages, defaults.packages)?,
        })
    }

    /// Rules for the project at `project_root`, falling back to defaults when
    /// `ckg.toml` is missing or cannot be read
    pub fn load(project_root: &Path) -> Self {
        let path = project_root.join(PROJECT_CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} in {}, using default layer rules", PROJECT_CONFIG_FILE, project_root.display());
                return Self::default();
            }
            Err(e) => {
                warn!("Failed to read {}: {}. Using default layer rules", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_toml(&content) {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Malformed {}: {}. Using default layer rules", path.display(), e);
                Self::default()
            }
        }
    }

    /// Annotations first, then COMPONENT node type, then name suffix, then package
    pub fn classify(&self, node: &CodeNode) -> Layer {
        let annotation_names: Vec<&str> = node
            .annotations
            .iter()
            .map(|a| annotation_name(a))
            .collect();
        for (layer, annotations) in &self.annotations {
            if annotations
                .iter()
                .any(|wanted| annotation_names.contains(&annotation_name(wanted)))
            {
                return *layer;
            }
        }

        if node.node_type == NodeType::Component {
            return Layer::Component;
        }

        // longest matching suffix wins
        let by_suffix = self
            .suffixes
            .iter()
            .flat_map(|(layer, suffixes)| suffixes.iter().map(move |s| (*layer, s)))
            .filter(|(_, suffix)| !suffix.is_empty() && node.name.ends_with(suffix.as_str()))
            .max_by(|(la, a), (lb, b)| a.len().cmp(&b.len()).then_with(|| lb.cmp(la)));
        if let Some((layer, _)) = by_suffix {
            return layer;
        }

        let segments: Vec<String> = package_segments(node)
            .map(|segment| segment.to_ascii_lowercase())
            .collect();
        for (layer, packages) in &self.packages {
            if packages
                .iter()
                .any(|p| segments.iter().any(|s| s.eq_ignore_ascii_case(p)))
            {
                return *layer;
            }
        }

        Layer::Other
    }
}

/// `@org.springframework.Service(...)` and `Service` both name `Service`
fn annotation_name(annotation: &str) -> &str {
    let trimmed = annotation.trim().trim_start_matches('@');
    let without_args = trimmed.split('(').next().unwrap_or(trimmed);
    without_args.rsplit('.').next().unwrap_or(without_args)
}

/// Package segments, or directory segments of the file when no package is declared
fn package_segments(node: &CodeNode) -> Box<dyn Iterator<Item = &str> + '_> {
    if node.package_name.is_empty() {
        let directories = node
            .file_path
            .rsplit_once('/')
            .map(|(dirs, _)| dirs)
            .unwrap_or("");
        Box::new(directories.split('/').filter(|s| !s.is_empty()))
    } else {
        Box::new(node.package_name.split(['.', '/', ':']).filter(|s| !s.is_empty()))
    }
}
