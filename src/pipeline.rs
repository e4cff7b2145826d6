//! Emission Engine - Single Entry Point
//!
//! Resolves the dialect from the record's selector and drives one shared
//! rendering pipeline. Either the full text is produced or an error is; there
//! is no partial output.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

use crate::dialect::{Dialect, GuardStyle, NamespacePlacement, FRAMEWORK_SYMBOLS, MODERN_FRAMEWORK_SYMBOLS, BANNER_LINES};
use crate::fields::{FieldDescriptor, FieldValue, MAX_TICKS};
use crate::hashing::{compute_record_hash, sha256_hex};
use crate::record::{CodeLanguage, MetadataRecord};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Unsupported code language: {0:?}")]
    UnsupportedLanguage(String),

    #[error("Field {field} has unsupported type {field_type:?}; expected String, Boolean or Ticks")]
    InvalidFieldType { field: String, field_type: String },

    #[error("Field {field} has malformed ticks value {value:?}")]
    MalformedTicksValue { field: String, value: String },

    #[error("Field {field} has malformed boolean value {value:?}")]
    MalformedBooleanValue { field: String, value: String },

    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Generated text plus the digests needed to show it is reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSource {
    pub language: CodeLanguage,
    pub file_extension: String,
    pub record_hash: String,
    pub code_hash: String,
    pub code: String,
}

/// Generate source text for `record` in the dialect it selects.
pub fn generate_code(record: &MetadataRecord) -> Result<String, GenerateError> {
    CodeGenerator::new().generate(record)
}

/// The emission engine. Holds no state between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, record: &MetadataRecord) -> Result<String, GenerateError> {
        let language = record.language()?;
        let dialect = Dialect::for_language(language);
        let members = collect_members(record)?;

        let mut out = SourceWriter::default();
        render_preamble(&mut out, dialect, record);

        if record.emit_this_assembly_class {
            render_type(&mut out, dialect, record, &members);
        }

        debug!(
            language = %language,
            members = members.len(),
            emit_class = record.emit_this_assembly_class,
            bytes = out.len(),
            "generated version info source"
        );

        Ok(out.finish())
    }

    /// Generate, then attach digests of the record and of the output.
    pub fn generate_manifest(&self, record: &MetadataRecord) -> Result<GeneratedSource, GenerateError> {
        let language = record.language()?;
        let code = self.generate(record)?;

        Ok(GeneratedSource {
            language,
            file_extension: language.file_extension().to_string(),
            record_hash: compute_record_hash(record)?,
            code_hash: sha256_hex(code.as_bytes()),
            code,
        })
    }
}

/// Names reserved by built-in members, whether or not a record emits them.
pub const BUILTIN_NAMES: [&str; 12] = [
    "AssemblyCompany",
    "AssemblyConfiguration",
    "AssemblyFileVersion",
    "AssemblyInformationalVersion",
    "AssemblyProduct",
    "AssemblyTitle",
    "AssemblyVersion",
    "GitCommitDate",
    "GitCommitId",
    "IsPrerelease",
    "IsPublicRelease",
    "RootNamespace",
];

/// Built-in members followed by custom fields, keyed (and so ordered) by name.
/// Members that should not be emitted are already gone.
fn collect_members(record: &MetadataRecord) -> Result<BTreeMap<String, FieldDescriptor>, GenerateError> {
    let mut members = BTreeMap::new();
    for builtin in builtin_members(record)? {
        if builtin.should_emit() {
            members.insert(builtin.name.clone(), builtin);
        }
    }

    let mut seen = BTreeSet::new();
    for spec in &record.additional_fields {
        let field = spec.resolve()?;
        if !seen.insert(field.name.clone()) || BUILTIN_NAMES.contains(&field.name.as_str()) {
            return Err(GenerateError::DuplicateField(field.name));
        }
        if field.should_emit() {
            members.insert(field.name.clone(), field);
        }
    }

    Ok(members)
}

fn builtin_members(record: &MetadataRecord) -> Result<Vec<FieldDescriptor>, GenerateError> {
    let string = |s: &str| FieldValue::String(s.to_string());

    let mut builtins = vec![
        FieldDescriptor::always("AssemblyCompany", string(&record.assembly_company)),
        FieldDescriptor::always("AssemblyFileVersion", string(&record.assembly_file_version)),
        FieldDescriptor::always("AssemblyVersion", string(&record.assembly_version)),
        FieldDescriptor::always("IsPrerelease", FieldValue::Boolean(record.is_prerelease)),
        FieldDescriptor::always("IsPublicRelease", FieldValue::Boolean(record.is_public_release)),
        FieldDescriptor::always(
            "RootNamespace",
            string(record.root_namespace.as_deref().unwrap_or_default()),
        ),
        FieldDescriptor::new("AssemblyInformationalVersion", string(&record.assembly_informational_version)),
        FieldDescriptor::new("AssemblyTitle", string(&record.assembly_title)),
        FieldDescriptor::new("AssemblyProduct", string(&record.assembly_product)),
        FieldDescriptor::new("AssemblyConfiguration", string(&record.assembly_configuration)),
        FieldDescriptor::new("GitCommitId", string(&record.git_commit_id)),
    ];

    if let Some(ticks) = record.git_commit_date {
        if !(0..=MAX_TICKS).contains(&ticks) {
            return Err(GenerateError::MalformedTicksValue {
                field: "GitCommitDate".to_string(),
                value: ticks.to_string(),
            });
        }
        builtins.push(FieldDescriptor::new("GitCommitDate", FieldValue::Ticks(ticks)));
    }

    Ok(builtins)
}

/// Banner, warning directive, assembly attributes, and for dialects that wrap
/// the whole file, the namespace line.
fn render_preamble(out: &mut SourceWriter, dialect: &Dialect, record: &MetadataRecord) {
    for line in BANNER_LINES {
        out.line(format!("{}{}", dialect.comment_prefix, line));
    }
    out.blank();
    out.line(dialect.warning_directive_line());
    out.blank();

    if let NamespacePlacement::File { fallback } = dialect.namespace {
        let namespace = record.effective_namespace().unwrap_or(fallback);
        out.line(dialect.namespace_line(namespace));
    }

    out.line(dialect.assembly_attribute("AssemblyVersionAttribute", &record.assembly_version));
    out.line(dialect.assembly_attribute("AssemblyFileVersionAttribute", &record.assembly_file_version));
    out.line(dialect.assembly_attribute(
        "AssemblyInformationalVersionAttribute",
        &record.assembly_informational_version,
    ));

    if let Some(end) = dialect.attribute_block_end {
        out.line(end);
    }
}

fn render_type(
    out: &mut SourceWriter,
    dialect: &Dialect,
    record: &MetadataRecord,
    members: &BTreeMap<String, FieldDescriptor>,
) {
    let close_namespace = match dialect.namespace {
        NamespacePlacement::AroundType { close } => record.explicit_namespace().map(|namespace| {
            out.line(dialect.namespace_line(namespace));
            close
        }),
        NamespacePlacement::File { .. } => None,
    };

    let generated_code = dialect.generated_code_attribute(record.generator_name(), record.generator_version());
    let exclude_from_coverage = dialect.exclude_from_coverage_attribute();

    match dialect.guard {
        GuardStyle::Stacked => {
            out.line(dialect.if_line(&FRAMEWORK_SYMBOLS));
            out.line(&generated_code);
            out.line(dialect.endif_line);
            out.line(dialect.if_line(&MODERN_FRAMEWORK_SYMBOLS));
            out.line(&exclude_from_coverage);
            out.line(dialect.endif_line);
            out.line(dialect.type_header);
        }
        GuardStyle::Chained => {
            out.line(dialect.if_line(&MODERN_FRAMEWORK_SYMBOLS));
            out.line(&generated_code);
            out.line(&exclude_from_coverage);
            out.line(dialect.type_header);
            out.line(dialect.elif_line(&FRAMEWORK_SYMBOLS));
            out.line(&generated_code);
            out.line(dialect.type_header);
            out.line(dialect.else_line);
            out.line(dialect.type_header);
            out.line(dialect.endif_line);
        }
    }

    for field in members.values() {
        let rendered = field.render(dialect);
        out.line(dialect.member(&rendered.name, rendered.field_type, rendered.kind, &rendered.literal));
    }

    out.line(dialect.type_close);
    if let Some(close) = close_namespace {
        out.line(close);
    }
}

#[derive(Debug, Default)]
struct SourceWriter {
    text: String,
}

impl SourceWriter {
    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn len(&self) -> usize {
        self.text.len()
    }

    fn finish(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldSpec;

    fn record(language: &str) -> MetadataRecord {
        MetadataRecord::new(language)
            .with_versions("1.3.0.0", "1.3.1.0", "")
            .with_company("company")
    }

    fn member_lines(code: &str, marker: &str) -> Vec<String> {
        code.lines()
            .filter(|l| l.trim_start().starts_with(marker))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_unsupported_language() {
        let err = generate_code(&record("java")).unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedLanguage(ref s) if s == "java"));
    }

    #[test]
    fn test_all_members_sorted_by_name() {
        let record = record("c#")
            .with_field(FieldSpec::string("Zeta", "z"))
            .with_field(FieldSpec::boolean("Alpha", true))
            .with_field(FieldSpec::string("Middle", "m"));
        let code = generate_code(&record).unwrap();

        let names: Vec<_> = member_lines(&code, "internal const")
            .iter()
            .map(|l| l.split_whitespace().nth(3).unwrap_or_default().to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.first().map(String::as_str), Some("Alpha"));
        assert_eq!(names.last().map(String::as_str), Some("Zeta"));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = record("vb")
            .with_field(FieldSpec::string("B", "2"))
            .with_field(FieldSpec::string("A", "1"));
        let b = record("vb")
            .with_field(FieldSpec::string("A", "1"))
            .with_field(FieldSpec::string("B", "2"));
        assert_eq!(generate_code(&a).unwrap(), generate_code(&b).unwrap());
    }

    #[test]
    fn test_duplicate_custom_field() {
        let record = record("f#")
            .with_field(FieldSpec::string("Custom", "a"))
            .with_field(FieldSpec::string("Custom", "b"));
        assert!(matches!(generate_code(&record), Err(GenerateError::DuplicateField(n)) if n == "Custom"));
    }

    #[test]
    fn test_custom_field_shadowing_builtin() {
        let record = record("c#").with_field(FieldSpec::string("AssemblyVersion", "9.9"));
        assert!(matches!(generate_code(&record), Err(GenerateError::DuplicateField(_))));
    }

    #[test]
    fn test_builtin_names_reserved_regardless_of_value() {
        let custom = FieldSpec::string("AssemblyInformationalVersion", "custom");
        assert!(matches!(
            generate_code(&record("c#").with_field(custom.clone())),
            Err(GenerateError::DuplicateField(n)) if n == "AssemblyInformationalVersion"
        ));
        let with_version = record("c#").with_versions("1.0", "1.0", "1.0-rc").with_field(custom);
        assert!(matches!(generate_code(&with_version), Err(GenerateError::DuplicateField(_))));

        let dropped = record("vb").with_field(FieldSpec::string("AssemblyVersion", ""));
        assert!(matches!(generate_code(&dropped), Err(GenerateError::DuplicateField(n)) if n == "AssemblyVersion"));

        let unset_commit_date = record("f#").with_field(FieldSpec::ticks("GitCommitDate", 1));
        assert!(matches!(generate_code(&unset_commit_date), Err(GenerateError::DuplicateField(_))));
    }

    #[test]
    fn test_builtin_names_cover_every_builtin() {
        let mut record = record("c#");
        record.git_commit_date = Some(0);
        let mut names: Vec<_> = builtin_members(&record).unwrap().into_iter().map(|f| f.name).collect();
        names.sort();
        assert_eq!(names, BUILTIN_NAMES);
    }

    #[test]
    fn test_invalid_field_fails_whole_generation() {
        let record = record("c#")
            .with_field(FieldSpec::string("Fine", "ok"))
            .with_field(FieldSpec::new("Broken", "Decimal", "1.0"));
        assert!(matches!(generate_code(&record), Err(GenerateError::InvalidFieldType { .. })));
    }

    #[test]
    fn test_informational_version_member_only_when_set() {
        let code = generate_code(&record("c#")).unwrap();
        assert!(!code.contains("internal const string AssemblyInformationalVersion"));

        let code = generate_code(&record("c#").with_versions("1.0", "1.0", "1.0-beta+g1234")).unwrap();
        assert!(code.contains("    internal const string AssemblyInformationalVersion = \"1.0-beta+g1234\";\n"));
    }

    #[test]
    fn test_git_commit_date_is_runtime_value() {
        let mut record = record("vb");
        record.git_commit_date = Some(637509805729817056);
        let code = generate_code(&record).unwrap();
        assert!(code.contains(
            "    Friend Shared ReadOnly GitCommitDate As Date = New Date(637509805729817056L, Global.System.DateTimeKind.Utc)\n"
        ));

        record.git_commit_date = Some(-5);
        assert!(matches!(generate_code(&record), Err(GenerateError::MalformedTicksValue { .. })));
    }

    #[test]
    fn test_generator_identity_override() {
        let mut record = record("c#");
        record.generator_name = Some("Tool".into());
        record.generator_version = Some("2.0".into());
        let code = generate_code(&record).unwrap();
        assert!(code.contains("[global::System.CodeDom.Compiler.GeneratedCode(\"Tool\",\"2.0\")]\n"));
    }

    #[test]
    fn test_manifest_hashes_are_stable() {
        let generator = CodeGenerator::new();
        let record = record("f#").with_field(FieldSpec::ticks("Built", 637509805729817056));
        let first = generator.generate_manifest(&record).unwrap();
        let second = generator.generate_manifest(&record).unwrap();
        assert_eq!(first.code_hash, second.code_hash);
        assert_eq!(first.record_hash, second.record_hash);
        assert_eq!(first.code_hash, sha256_hex(first.code.as_bytes()));
        assert_eq!(first.file_extension, "fs");
    }
}
