use serde::Deserialize;
use std::path::Path;

use crate::error::{ModgraphError, Result};

/// Rendering attributes for DOT output.
///
/// Loaded from a TOML overlay; any key left out keeps its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DotAttributes {
    #[serde(default = "default_rank_sep")]
    pub rank_sep: f64,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_font_name")]
    pub font_name: String,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default = "default_arrow_size")]
    pub arrow_size: f64,
    #[serde(default = "default_arrow_width")]
    pub arrow_width: f64,
    #[serde(default = "default_arrow_color")]
    pub arrow_color: String,
    #[serde(default = "default_requires_mandated_color")]
    pub requires_mandated_color: String,
    #[serde(default = "default_platform_subgraph_color")]
    pub platform_subgraph_color: String,
    #[serde(default = "default_rest_subgraph_color")]
    pub rest_subgraph_color: String,
    /// Module-name prefix of the platform namespace.
    #[serde(default = "default_platform_prefix")]
    pub platform_prefix: String,
    /// Weight of edges whose endpoints are both platform modules.
    #[serde(default = "default_platform_weight")]
    pub platform_weight: u32,
    /// Explicit per-edge weights; these win over `platform_weight`.
    #[serde(default)]
    pub weights: Vec<WeightRule>,
    /// Bands of modules laid out on the same rank.
    #[serde(default)]
    pub ranks: Vec<Vec<String>>,
}

/// An explicit weight for one `from -> to` edge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightRule {
    pub from: String,
    pub to: String,
    pub weight: u32,
}

impl Default for DotAttributes {
    fn default() -> Self {
        Self {
            rank_sep: default_rank_sep(),
            font_size: default_font_size(),
            font_name: default_font_name(),
            font_color: default_font_color(),
            arrow_size: default_arrow_size(),
            arrow_width: default_arrow_width(),
            arrow_color: default_arrow_color(),
            requires_mandated_color: default_requires_mandated_color(),
            platform_subgraph_color: default_platform_subgraph_color(),
            rest_subgraph_color: default_rest_subgraph_color(),
            platform_prefix: default_platform_prefix(),
            platform_weight: default_platform_weight(),
            weights: Vec::new(),
            ranks: Vec::new(),
        }
    }
}

impl DotAttributes {
    /// Parse an overlay from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ModgraphError::ConfigParse`] on syntax errors, unknown keys
    /// or mistyped values. `origin` is used as the path in the error.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str::<Self>(text).map_err(|source| ModgraphError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Returns `true` if `module` belongs to the platform namespace.
    #[must_use]
    pub fn is_platform(&self, module: &str) -> bool {
        module.starts_with(&self.platform_prefix)
    }

    /// The explicit weight configured for `from -> to`, if any.
    ///
    /// The last matching rule wins.
    #[must_use]
    pub fn explicit_weight(&self, from: &str, to: &str) -> Option<u32> {
        self.weights
            .iter()
            .rev()
            .find(|rule| rule.from == from && rule.to == to)
            .map(|rule| rule.weight)
    }
}

/// Load rendering attributes, or the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns [`ModgraphError::Io`] if the file cannot be read and
/// [`ModgraphError::ConfigParse`] if it cannot be parsed.
pub fn load_dot_attributes(path: Option<&Path>) -> Result<DotAttributes> {
    let Some(path) = path else {
        return Ok(DotAttributes::default());
    };

    let content = std::fs::read_to_string(path).map_err(|source| ModgraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    DotAttributes::from_toml_str(&content, path)
}

const fn default_rank_sep() -> f64 {
    0.6
}

const fn default_font_size() -> u32 {
    12
}

fn default_font_name() -> String {
    "DejaVuSans".to_string()
}

fn default_font_color() -> String {
    "#000000".to_string()
}

const fn default_arrow_size() -> f64 {
    1.0
}

const fn default_arrow_width() -> f64 {
    2.0
}

fn default_arrow_color() -> String {
    "#999999".to_string()
}

fn default_requires_mandated_color() -> String {
    "#dddddd".to_string()
}

fn default_platform_subgraph_color() -> String {
    "#e76f00".to_string()
}

fn default_rest_subgraph_color() -> String {
    "#437291".to_string()
}

fn default_platform_prefix() -> String {
    "java.".to_string()
}

const fn default_platform_weight() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn origin() -> PathBuf {
        PathBuf::from("attrs.toml")
    }

    #[test]
    fn empty_overlay_is_default() {
        let attrs = DotAttributes::from_toml_str("", &origin()).unwrap();
        assert_eq!(attrs, DotAttributes::default());
    }

    #[test]
    fn partial_overlay_keeps_other_defaults() {
        let attrs = DotAttributes::from_toml_str(
            "fontSize = 14\narrowColor = \"#ff0000\"\n",
            &origin(),
        )
        .unwrap();
        assert_eq!(attrs.font_size, 14);
        assert_eq!(attrs.arrow_color, "#ff0000");
        assert_eq!(attrs.font_name, "DejaVuSans");
        assert!((attrs.rank_sep - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn weights_and_ranks_parse() {
        let text = r#"
ranks = [["java.logging", "java.xml"], ["java.sql"]]

[[weights]]
from = "java.se"
to = "java.sql"
weight = 3

[[weights]]
from = "java.se"
to = "java.sql"
weight = 7
"#;
        let attrs = DotAttributes::from_toml_str(text, &origin()).unwrap();
        assert_eq!(attrs.ranks.len(), 2);
        assert_eq!(attrs.explicit_weight("java.se", "java.sql"), Some(7));
        assert_eq!(attrs.explicit_weight("java.sql", "java.se"), None);
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = DotAttributes::from_toml_str("nodeShape = \"box\"\n", &origin()).unwrap_err();
        assert!(matches!(err, ModgraphError::ConfigParse { .. }));
    }

    #[test]
    fn platform_membership_uses_prefix() {
        let attrs = DotAttributes::default();
        assert!(attrs.is_platform("java.sql"));
        assert!(!attrs.is_platform("jdk.httpserver"));
    }

    #[test]
    fn load_without_path_is_default() {
        assert_eq!(load_dot_attributes(None).unwrap(), DotAttributes::default());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dot_attributes(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ModgraphError::Io { .. }));
    }
}
