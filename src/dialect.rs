//! Backend Descriptors - token spelling for each target dialect
//!
//! The three dialects share one rendering pipeline (see [`crate::pipeline`]).
//! A [`Dialect`] only says how each piece is spelled and where the namespace
//! and conditional-compilation guards go.

use crate::fields::{FieldType, ValueKind};
use crate::record::CodeLanguage;

/// Symbols of frameworks that know the code-generation annotation.
pub const FRAMEWORK_SYMBOLS: [&str; 3] = ["NETSTANDARD", "NETFRAMEWORK", "NETCOREAPP"];
/// Symbols of frameworks that also know the coverage-exclusion annotation.
pub const MODERN_FRAMEWORK_SYMBOLS: [&str; 3] =
    ["NET40_OR_GREATER", "NETCOREAPP2_0_OR_GREATER", "NETSTANDARD2_0_OR_GREATER"];

pub const SUPPRESSED_DIAGNOSTIC: &str = "CA2243";

/// Banner body lines, written after the comment prefix.
pub const BANNER_LINES: [&str; 9] = [
    "------------------------------------------------------------------------------",
    " <auto-generated>",
    "     This code was generated by a tool.",
    "     Runtime Version:4.0.30319.42000",
    "",
    "     Changes to this file may cause incorrect behavior and will be lost if",
    "     the code is regenerated.",
    " </auto-generated>",
    "------------------------------------------------------------------------------",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringSyntax {
    /// Backslash escapes, `"` becomes `\"`.
    Escaped,
    /// `"` doubles to `""`; control characters are spliced in with `ChrW`.
    Doubled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespacePlacement {
    /// Opened before the attributes, always, falling back to a fixed name.
    /// Never explicitly closed.
    File { fallback: &'static str },
    /// Opened after the attributes, around the type, only for an explicit
    /// `thisAssemblyNamespace`.
    AroundType { close: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStyle {
    /// One `#if` block per annotation, followed by a single type header.
    Stacked,
    /// One `#if`/`#elif`/`#else` chain repeating the type header per branch.
    Chained,
}

/// Where a member's type name goes, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePlacement {
    /// `const string Name`
    BeforeName,
    /// `Const Name As String`
    AsClause,
    /// Inferred from the initializer.
    Omitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub language: CodeLanguage,
    pub comment_prefix: &'static str,
    /// Directive text around [`SUPPRESSED_DIAGNOSTIC`].
    pub warning_directive: (&'static str, &'static str),
    /// Prefix for fully qualified type names, e.g. `global::`.
    pub global: &'static str,
    pub assembly_attribute_open: &'static str,
    pub attribute_open: &'static str,
    pub attribute_close: &'static str,
    /// Line ending the attribute block, if the dialect needs one.
    pub attribute_block_end: Option<&'static str>,
    pub namespace_open: &'static str,
    pub namespace_open_suffix: &'static str,
    pub namespace: NamespacePlacement,
    pub guard: GuardStyle,
    pub if_open: &'static str,
    pub if_then: &'static str,
    pub elif_open: &'static str,
    pub else_line: &'static str,
    pub endif_line: &'static str,
    pub or_operator: &'static str,
    pub type_header: &'static str,
    pub type_close: &'static str,
    pub member_indent: &'static str,
    pub constant_modifiers: &'static str,
    pub runtime_modifiers: &'static str,
    pub member_terminator: &'static str,
    pub type_placement: TypePlacement,
    pub string_type: &'static str,
    pub bool_type: &'static str,
    pub date_time_type: &'static str,
    pub date_time_new: &'static str,
    pub true_literal: &'static str,
    pub false_literal: &'static str,
    pub string_syntax: StringSyntax,
}

pub const CSHARP: Dialect = Dialect {
    language: CodeLanguage::CSharp,
    comment_prefix: "//",
    warning_directive: ("#pragma warning disable ", ""),
    global: "global::",
    assembly_attribute_open: "[assembly: ",
    attribute_open: "[",
    attribute_close: "]",
    attribute_block_end: None,
    namespace_open: "namespace ",
    namespace_open_suffix: " {",
    namespace: NamespacePlacement::AroundType { close: "}" },
    guard: GuardStyle::Stacked,
    if_open: "#if ",
    if_then: "",
    elif_open: "#elif ",
    else_line: "#else",
    endif_line: "#endif",
    or_operator: " || ",
    type_header: "internal static partial class ThisAssembly {",
    type_close: "}",
    member_indent: "    ",
    constant_modifiers: "internal const ",
    runtime_modifiers: "internal static readonly ",
    member_terminator: ";",
    type_placement: TypePlacement::BeforeName,
    string_type: "string",
    bool_type: "bool",
    date_time_type: "global::System.DateTime",
    date_time_new: "new global::System.DateTime",
    true_literal: "true",
    false_literal: "false",
    string_syntax: StringSyntax::Escaped,
};

pub const FSHARP: Dialect = Dialect {
    language: CodeLanguage::FSharp,
    comment_prefix: "//",
    warning_directive: ("#nowarn \"", "\""),
    global: "global.",
    assembly_attribute_open: "[<assembly: ",
    attribute_open: "[<",
    attribute_close: ">]",
    attribute_block_end: Some("do()"),
    namespace_open: "namespace ",
    namespace_open_suffix: "",
    namespace: NamespacePlacement::File { fallback: "AssemblyInfo" },
    guard: GuardStyle::Stacked,
    if_open: "#if ",
    if_then: "",
    elif_open: "#elif ",
    else_line: "#else",
    endif_line: "#endif",
    or_operator: " || ",
    type_header: "type internal ThisAssembly() =",
    type_close: "do()",
    member_indent: "  ",
    constant_modifiers: "static member internal ",
    runtime_modifiers: "static member internal ",
    member_terminator: "",
    type_placement: TypePlacement::Omitted,
    string_type: "",
    bool_type: "",
    date_time_type: "",
    date_time_new: "new global.System.DateTime",
    true_literal: "true",
    false_literal: "false",
    string_syntax: StringSyntax::Escaped,
};

pub const VISUAL_BASIC: Dialect = Dialect {
    language: CodeLanguage::VisualBasic,
    comment_prefix: "'",
    warning_directive: ("#Disable Warning ", ""),
    global: "Global.",
    assembly_attribute_open: "<Assembly: ",
    attribute_open: "<",
    attribute_close: ">",
    attribute_block_end: None,
    namespace_open: "Namespace ",
    namespace_open_suffix: "",
    namespace: NamespacePlacement::AroundType { close: "End Namespace" },
    guard: GuardStyle::Chained,
    if_open: "#If ",
    if_then: " Then",
    elif_open: "#ElseIf ",
    else_line: "#Else",
    endif_line: "#End If",
    or_operator: "  Or  ",
    type_header: "Partial Friend NotInheritable Class ThisAssembly",
    type_close: "End Class",
    member_indent: "    ",
    constant_modifiers: "Friend Const ",
    runtime_modifiers: "Friend Shared ReadOnly ",
    member_terminator: "",
    type_placement: TypePlacement::AsClause,
    string_type: "String",
    bool_type: "Boolean",
    date_time_type: "Date",
    date_time_new: "New Date",
    true_literal: "True",
    false_literal: "False",
    string_syntax: StringSyntax::Doubled,
};

impl Dialect {
    pub fn for_language(language: CodeLanguage) -> &'static Dialect {
        match language {
            CodeLanguage::CSharp => &CSHARP,
            CodeLanguage::FSharp => &FSHARP,
            CodeLanguage::VisualBasic => &VISUAL_BASIC,
        }
    }

    pub fn warning_directive_line(&self) -> String {
        let (open, close) = self.warning_directive;
        format!("{}{}{}", open, SUPPRESSED_DIAGNOSTIC, close)
    }

    pub fn bool_literal(&self, value: bool) -> &'static str {
        if value { self.true_literal } else { self.false_literal }
    }

    pub fn string_literal(&self, value: &str) -> String {
        match self.string_syntax {
            StringSyntax::Escaped => escaped_literal(value),
            StringSyntax::Doubled => doubled_literal(value, self.global),
        }
    }

    /// A UTC date/time constructed from an exact tick count.
    pub fn date_time_literal(&self, ticks: i64) -> String {
        format!(
            "{}({}L, {}System.DateTimeKind.Utc)",
            self.date_time_new, ticks, self.global
        )
    }

    /// `#if A || B || C` (or the chained-dialect spelling).
    pub fn if_line(&self, symbols: &[&str]) -> String {
        format!("{}{}{}", self.if_open, symbols.join(self.or_operator), self.if_then)
    }

    pub fn elif_line(&self, symbols: &[&str]) -> String {
        format!("{}{}{}", self.elif_open, symbols.join(self.or_operator), self.if_then)
    }

    pub fn assembly_attribute(&self, attribute: &str, argument: &str) -> String {
        format!(
            "{}{}System.Reflection.{}({}){}",
            self.assembly_attribute_open,
            self.global,
            attribute,
            self.string_literal(argument),
            self.attribute_close
        )
    }

    pub fn generated_code_attribute(&self, name: &str, version: &str) -> String {
        format!(
            "{}{}System.CodeDom.Compiler.GeneratedCode({},{}){}",
            self.attribute_open,
            self.global,
            self.string_literal(name),
            self.string_literal(version),
            self.attribute_close
        )
    }

    pub fn exclude_from_coverage_attribute(&self) -> String {
        format!(
            "{}{}System.Diagnostics.CodeAnalysis.ExcludeFromCodeCoverage{}",
            self.attribute_open, self.global, self.attribute_close
        )
    }

    pub fn namespace_line(&self, namespace: &str) -> String {
        format!("{}{}{}", self.namespace_open, namespace, self.namespace_open_suffix)
    }

    pub fn member(&self, name: &str, field_type: FieldType, kind: ValueKind, literal: &str) -> String {
        let modifiers = match kind {
            ValueKind::Constant => self.constant_modifiers,
            ValueKind::Runtime => self.runtime_modifiers,
        };
        let type_name = match field_type {
            FieldType::String => self.string_type,
            FieldType::Boolean => self.bool_type,
            FieldType::Ticks => self.date_time_type,
        };
        let declaration = match self.type_placement {
            TypePlacement::BeforeName => format!("{} {}", type_name, name),
            TypePlacement::AsClause => format!("{} As {}", name, type_name),
            TypePlacement::Omitted => name.to_string(),
        };
        format!(
            "{}{}{} = {}{}",
            self.member_indent, modifiers, declaration, literal, self.member_terminator
        )
    }
}

fn escaped_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if is_line_breaking(c) => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn doubled_literal(value: &str, global: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\"\""),
            c if is_line_breaking(c) => {
                out.push_str(&format!(
                    "\" & {}Microsoft.VisualBasic.ChrW({}) & \"",
                    global, c as u32
                ));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Characters that cannot appear raw inside a single-line string literal.
/// U+2028 and U+2029 are line terminators in these languages.
fn is_line_breaking(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}')
}
