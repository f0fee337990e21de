//! # Compile Options
//!
//! Every knob the compiler reads. [`CompileOptions`] deserializes from a YAML
//! or JSON configuration file with all fields optional, so a file only needs
//! to name what it changes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options for one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompileOptions {
    /// Prune non-configuration nodes entirely.
    pub config_only: bool,
    /// Rewrite `prefix:name` property keys to `name`.
    pub strip_namespaces: bool,
    /// JSON Schema draft of the output document.
    pub draft: SchemaDraft,
    /// How YANG values are encoded in JSON.
    pub encoding: Encoding,
    /// Treatment of `config true` below a `config false` ancestor.
    pub config_policy: ConfigPolicy,
    /// Shape of the document root.
    pub layout: Layout,
    /// Emit `description` annotations.
    pub annotate: bool,
    /// The `additionalProperties` value on every object.
    pub additional_properties: bool,
    /// Render identityrefs as an `enum` of known derived identities.
    pub closed_identities: bool,
    /// Document title; defaults to the root name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            config_only: false,
            strip_namespaces: false,
            draft: SchemaDraft::default(),
            encoding: Encoding::default(),
            config_policy: ConfigPolicy::default(),
            layout: Layout::default(),
            annotate: true,
            additional_properties: false,
            closed_identities: true,
            title: None,
        }
    }
}

/// Error parsing an option value from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {option} '{value}' (expected one of: {expected})")]
pub struct OptionParseError {
    option: &'static str,
    value: String,
    expected: &'static str,
}

/// JSON Schema draft identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SchemaDraft {
    Draft07,
    Draft201909,
    #[default]
    Draft202012,
}

impl SchemaDraft {
    /// The `$schema` URI of this draft.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Draft07 => "http://json-schema.org/draft-07/schema#",
            Self::Draft201909 => "https://json-schema.org/draft/2019-09/schema",
            Self::Draft202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Short name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft07 => "draft-07",
            Self::Draft201909 => "2019-09",
            Self::Draft202012 => "2020-12",
        }
    }

    /// Whether tuple validation uses `prefixItems` (2020-12) rather than
    /// array-form `items`.
    pub fn has_prefix_items(&self) -> bool {
        matches!(self, Self::Draft202012)
    }
}

impl fmt::Display for SchemaDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaDraft {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let draft = match s.trim() {
            "draft-07" | "draft7" | "7" => Self::Draft07,
            "2019-09" | "draft-2019-09" => Self::Draft201909,
            "2020-12" | "draft-2020-12" => Self::Draft202012,
            other => {
                return [Self::Draft07, Self::Draft201909, Self::Draft202012]
                    .into_iter()
                    .find(|d| d.uri().trim_end_matches('#') == other.trim_end_matches('#'))
                    .ok_or_else(|| OptionParseError {
                        option: "schema draft",
                        value: other.to_string(),
                        expected: "draft-07, 2019-09, 2020-12, or a draft URI",
                    })
            }
        };
        Ok(draft)
    }
}

impl TryFrom<String> for SchemaDraft {
    type Error = OptionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaDraft> for String {
    fn from(draft: SchemaDraft) -> Self {
        draft.as_str().to_string()
    }
}

/// JSON encoding of YANG values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// Native JSON numbers for every numeric type, `empty` as a boolean.
    #[default]
    Plain,
    /// RFC 7951: 64-bit integers and decimal64 as strings, `empty` as `[null]`.
    Rfc7951,
}

impl FromStr for Encoding {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "rfc7951" => Ok(Self::Rfc7951),
            other => Err(OptionParseError {
                option: "encoding",
                value: other.to_string(),
                expected: "plain, rfc7951",
            }),
        }
    }
}

/// Treatment of an explicit `config true` under a `config false` ancestor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigPolicy {
    /// Force the node to `config false`. Real vendor models violate the rule.
    #[default]
    Permissive,
    /// Fail the compilation with `ConfigConflict`.
    Strict,
}

/// Shape of the document root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Data nodes are the root's properties.
    #[default]
    Flat,
    /// Root has a `data` object and an `operations` object (rpcs and actions).
    Split,
}

impl FromStr for Layout {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Self::Flat),
            "split" => Ok(Self::Split),
            other => Err(OptionParseError {
                option: "layout",
                value: other.to_string(),
                expected: "flat, split",
            }),
        }
    }
}
