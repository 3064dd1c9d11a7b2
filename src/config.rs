//! YAML configuration file support for genelink.
//!
//! One file holds defaults for both matching modes and for output rendering.
//! Every section is optional; command-line flags override file values.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "arabidopsis synteny"
//!
//! relation:
//!   target_column: "Gene"
//!   left_column: "GeneA"
//!   right_column: "GeneB"
//!   depth: 3
//!   fuzzy: false
//!   no_match: "marker"
//!
//! lookup:
//!   target_column: "Query"
//!   left_column: "Symbol"
//!   right_column: "Alias"
//!   threshold_ratio: 0.8
//!   max_candidates: 500
//!   export_other_columns: true
//!
//! output:
//!   layout: "vertical"
//!   delimiter: ","
//! ```

use std::fs;
use std::path::Path;

use index::{ApproxConfig, DEFAULT_DEPTH, DEFAULT_MAX_CANDIDATES, DEFAULT_THRESHOLD_RATIO};
use matcher::{ColumnPair, NoMatchPolicy, RelationMatchConfig, TokenMatchConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}

/// How a finished batch is laid out in the output table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// One row per match, repeating the target row.
    #[default]
    Vertical,
    /// One row per target, `Match 1..N` columns.
    Horizontal,
    /// One row per target, matches joined into one cell.
    Joined,
    /// Token mode only: one row per matching reference row.
    Detail,
}

/// Top-level YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenelinkConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub relation: RelationYamlConfig,

    #[serde(default)]
    pub lookup: LookupYamlConfig,

    #[serde(default)]
    pub output: OutputYamlConfig,
}

impl GenelinkConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: GenelinkConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.relation.validate()?;
        self.lookup.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

impl Default for GenelinkConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            relation: RelationYamlConfig::default(),
            lookup: LookupYamlConfig::default(),
            output: OutputYamlConfig::default(),
        }
    }
}

/// Relation-mode YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationYamlConfig {
    #[serde(default)]
    pub target_column: Option<String>,

    #[serde(default)]
    pub left_column: Option<String>,

    #[serde(default)]
    pub right_column: Option<String>,

    #[serde(default = "default_depth")]
    pub depth: usize,

    #[serde(default)]
    pub fuzzy: bool,

    #[serde(default)]
    pub no_match: NoMatchPolicy,

    #[serde(default)]
    pub parallel: bool,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl RelationYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        self.to_match_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("relation: {e}")))
    }

    /// Runtime config for a relation session.
    pub fn to_match_config(&self) -> RelationMatchConfig {
        RelationMatchConfig {
            depth: self.depth,
            fuzzy: self.fuzzy,
            no_match: self.no_match,
            parallel: self.parallel,
            chunk_size: self.chunk_size,
        }
    }

    /// Designated columns, if both are set.
    pub fn columns(&self) -> Option<ColumnPair> {
        column_pair(&self.left_column, &self.right_column)
    }
}

impl Default for RelationYamlConfig {
    fn default() -> Self {
        Self {
            target_column: None,
            left_column: None,
            right_column: None,
            depth: default_depth(),
            fuzzy: false,
            no_match: NoMatchPolicy::default(),
            parallel: false,
            chunk_size: default_chunk_size(),
        }
    }
}

/// Token-mode YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupYamlConfig {
    #[serde(default)]
    pub target_column: Option<String>,

    #[serde(default)]
    pub left_column: Option<String>,

    #[serde(default)]
    pub right_column: Option<String>,

    #[serde(default = "default_threshold")]
    pub threshold_ratio: f64,

    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    #[serde(default = "true_value")]
    pub export_other_columns: bool,

    #[serde(default)]
    pub no_match: NoMatchPolicy,

    #[serde(default)]
    pub parallel: bool,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl LookupYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        self.to_match_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("lookup: {e}")))
    }

    /// Runtime config for a token session.
    pub fn to_match_config(&self) -> TokenMatchConfig {
        TokenMatchConfig {
            approx: ApproxConfig::new()
                .with_threshold(self.threshold_ratio)
                .with_max_candidates(self.max_candidates),
            export_other_columns: self.export_other_columns,
            no_match: self.no_match,
            parallel: self.parallel,
            chunk_size: self.chunk_size,
        }
    }

    pub fn columns(&self) -> Option<ColumnPair> {
        column_pair(&self.left_column, &self.right_column)
    }
}

impl Default for LookupYamlConfig {
    fn default() -> Self {
        Self {
            target_column: None,
            left_column: None,
            right_column: None,
            threshold_ratio: default_threshold(),
            max_candidates: default_max_candidates(),
            export_other_columns: true,
            no_match: NoMatchPolicy::default(),
            parallel: false,
            chunk_size: default_chunk_size(),
        }
    }
}

/// Output YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputYamlConfig {
    /// Layout for both modes; when unset, relate renders vertically and
    /// lookup renders the detail table.
    #[serde(default)]
    pub layout: Option<LayoutKind>,

    /// Field delimiter for CSV output; must be a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Header of the match column in the vertical layout.
    #[serde(default = "default_match_header")]
    pub match_header: String,
}

impl OutputYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if !self.delimiter.is_ascii() {
            return Err(ConfigLoadError::Validation(
                "output.delimiter must be an ASCII character".to_string(),
            ));
        }
        if self.match_header.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "output.match_header must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn relation_layout(&self) -> LayoutKind {
        self.layout.unwrap_or(LayoutKind::Vertical)
    }

    pub fn lookup_layout(&self) -> LayoutKind {
        self.layout.unwrap_or(LayoutKind::Detail)
    }

    /// Delimiter as the byte the csv writer expects.
    pub fn delimiter_byte(&self) -> u8 {
        // validated ASCII
        self.delimiter as u8
    }
}

impl Default for OutputYamlConfig {
    fn default() -> Self {
        Self {
            layout: None,
            delimiter: default_delimiter(),
            match_header: default_match_header(),
        }
    }
}

fn column_pair(left: &Option<String>, right: &Option<String>) -> Option<ColumnPair> {
    match (left, right) {
        (Some(l), Some(r)) => Some(ColumnPair::new(l.as_str(), r.as_str())),
        _ => None,
    }
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

fn default_chunk_size() -> usize {
    RelationMatchConfig::default().chunk_size
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_RATIO
}

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

fn true_value() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

fn default_match_header() -> String {
    "Match".to_string()
}
