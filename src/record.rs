//! Metadata Record - what a single generation call emits

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::fields::FieldSpec;
use crate::pipeline::GenerateError;
use crate::{GENERATOR_NAME, GENERATOR_VERSION};

/// Target dialect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeLanguage {
    #[serde(rename = "c#")]
    CSharp,
    #[serde(rename = "f#")]
    FSharp,
    #[serde(rename = "vb")]
    VisualBasic,
}

impl CodeLanguage {
    /// The selector string callers pass in `codeLanguage`.
    pub const fn selector(&self) -> &'static str {
        match self {
            Self::CSharp => "c#",
            Self::FSharp => "f#",
            Self::VisualBasic => "vb",
        }
    }

    pub const fn file_extension(&self) -> &'static str {
        match self {
            Self::CSharp => "cs",
            Self::FSharp => "fs",
            Self::VisualBasic => "vb",
        }
    }

    pub const fn all() -> &'static [Self] {
        &[Self::CSharp, Self::FSharp, Self::VisualBasic]
    }
}

impl fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for CodeLanguage {
    type Err = GenerateError;

    /// Selectors match exactly; `"C#"` is not `"c#"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|lang| lang.selector() == s)
            .ok_or_else(|| GenerateError::UnsupportedLanguage(s.to_string()))
    }
}

/// Everything the generator needs for one invocation.
///
/// Built fully by the caller, read-only while generating. `code_language` stays
/// a plain string so an unknown selector surfaces as
/// [`GenerateError::UnsupportedLanguage`] at generation time rather than at
/// deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    #[serde(default)]
    pub assembly_version: String,
    #[serde(default)]
    pub assembly_file_version: String,
    #[serde(default)]
    pub assembly_informational_version: String,
    #[serde(default)]
    pub assembly_company: String,
    #[serde(default)]
    pub assembly_title: String,
    #[serde(default)]
    pub assembly_product: String,
    #[serde(default)]
    pub assembly_configuration: String,
    #[serde(default)]
    pub git_commit_id: String,
    /// Commit instant in ticks; emitted as a date/time member when set.
    #[serde(default)]
    pub git_commit_date: Option<i64>,
    #[serde(default)]
    pub is_prerelease: bool,
    #[serde(default)]
    pub is_public_release: bool,
    #[serde(default)]
    pub root_namespace: Option<String>,
    #[serde(default)]
    pub this_assembly_namespace: Option<String>,
    #[serde(default = "default_true")]
    pub emit_this_assembly_class: bool,
    #[serde(default = "default_language")]
    pub code_language: String,
    #[serde(default)]
    pub additional_fields: Vec<FieldSpec>,
    #[serde(default)]
    pub generator_name: Option<String>,
    #[serde(default)]
    pub generator_version: Option<String>,
}

fn default_true() -> bool { true }

fn default_language() -> String { CodeLanguage::CSharp.selector().to_string() }

impl Default for MetadataRecord {
    fn default() -> Self {
        Self {
            assembly_version: String::new(),
            assembly_file_version: String::new(),
            assembly_informational_version: String::new(),
            assembly_company: String::new(),
            assembly_title: String::new(),
            assembly_product: String::new(),
            assembly_configuration: String::new(),
            git_commit_id: String::new(),
            git_commit_date: None,
            is_prerelease: false,
            is_public_release: false,
            root_namespace: None,
            this_assembly_namespace: None,
            emit_this_assembly_class: true,
            code_language: default_language(),
            additional_fields: vec![],
            generator_name: None,
            generator_version: None,
        }
    }
}

impl MetadataRecord {
    pub fn new(code_language: impl Into<String>) -> Self {
        Self {
            code_language: code_language.into(),
            ..Self::default()
        }
    }

    pub fn with_versions(
        mut self,
        assembly_version: impl Into<String>,
        assembly_file_version: impl Into<String>,
        assembly_informational_version: impl Into<String>,
    ) -> Self {
        self.assembly_version = assembly_version.into();
        self.assembly_file_version = assembly_file_version.into();
        self.assembly_informational_version = assembly_informational_version.into();
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.assembly_company = company.into();
        self
    }

    pub fn with_release_flags(mut self, is_prerelease: bool, is_public_release: bool) -> Self {
        self.is_prerelease = is_prerelease;
        self.is_public_release = is_public_release;
        self
    }

    pub fn with_root_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.root_namespace = Some(namespace.into());
        self
    }

    pub fn with_this_assembly_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.this_assembly_namespace = Some(namespace.into());
        self
    }

    pub fn with_this_assembly_class(mut self, emit: bool) -> Self {
        self.emit_this_assembly_class = emit;
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.additional_fields.push(field);
        self
    }

    /// Resolve the selector, failing on anything but `c#`, `f#` or `vb`.
    pub fn language(&self) -> Result<CodeLanguage, GenerateError> {
        self.code_language.parse()
    }

    /// `thisAssemblyNamespace` when it holds something other than whitespace.
    pub fn explicit_namespace(&self) -> Option<&str> {
        non_blank(self.this_assembly_namespace.as_deref())
    }

    /// Explicit namespace, else the root namespace, else nothing.
    pub fn effective_namespace(&self) -> Option<&str> {
        self.explicit_namespace()
            .or_else(|| non_blank(self.root_namespace.as_deref()))
    }

    pub fn generator_name(&self) -> &str {
        self.generator_name.as_deref().unwrap_or(GENERATOR_NAME)
    }

    pub fn generator_version(&self) -> &str {
        self.generator_version.as_deref().unwrap_or(GENERATOR_VERSION)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_is_case_sensitive() {
        assert_eq!("vb".parse::<CodeLanguage>().unwrap(), CodeLanguage::VisualBasic);
        assert!(matches!(
            "C#".parse::<CodeLanguage>(),
            Err(GenerateError::UnsupportedLanguage(s)) if s == "C#"
        ));
    }

    #[test]
    fn test_deserialize_defaults() {
        let record: MetadataRecord = serde_json::from_str(r#"{"assemblyVersion": "1.0.0.0"}"#).unwrap();
        assert!(record.emit_this_assembly_class);
        assert_eq!(record.code_language, "c#");
        assert_eq!(record.assembly_informational_version, "");
        assert!(record.additional_fields.is_empty());
    }

    #[test]
    fn test_namespace_precedence() {
        let record = MetadataRecord::new("f#")
            .with_root_namespace("Root")
            .with_this_assembly_namespace("   ");
        assert_eq!(record.explicit_namespace(), None);
        assert_eq!(record.effective_namespace(), Some("Root"));

        let record = record.with_this_assembly_namespace("Custom");
        assert_eq!(record.effective_namespace(), Some("Custom"));

        assert_eq!(MetadataRecord::new("f#").with_root_namespace("").effective_namespace(), None);
    }

    #[test]
    fn test_generator_defaults_to_crate_identity() {
        let record = MetadataRecord::default();
        assert_eq!(record.generator_name(), GENERATOR_NAME);
        assert_eq!(record.generator_version(), GENERATOR_VERSION);
    }
}
