//! Field Descriptors - typed members of the companion type
//!
//! Callers hand in loosely typed [`FieldSpec`]s (a name, a type tag and a raw
//! value). Generation resolves each one into a [`FieldDescriptor`] carrying a
//! [`FieldValue`], and renders it per dialect into a [`RenderedField`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::dialect::Dialect;
use crate::pipeline::GenerateError;

pub const TICKS_PER_SECOND: i64 = 10_000_000;
/// Ticks at 1970-01-01T00:00:00Z, counted from 0001-01-01T00:00:00Z.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
/// Ticks at 9999-12-31T23:59:59.9999999Z, the last representable instant.
pub const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

const EMIT_IF_EMPTY_KEY: &str = "EmitIfEmpty";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Boolean,
    Ticks,
}

impl FieldType {
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Ticks => "Ticks",
        }
    }

    pub const fn all() -> &'static [Self] {
        &[Self::String, Self::Boolean, Self::Ticks]
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FieldType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all().iter().copied().find(|t| t.tag() == s).ok_or(())
    }
}

/// How a member is declared in the generated type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Compile-time constant.
    Constant,
    /// Initialized once at runtime; date/time values are never constants.
    Runtime,
}

/// A caller-supplied field as it arrives from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub emit_if_empty: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            value: value.into(),
            emit_if_empty: false,
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FieldType::String.tag(), value)
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, FieldType::Boolean.tag(), value.to_string())
    }

    pub fn ticks(name: impl Into<String>, ticks: i64) -> Self {
        Self::new(name, FieldType::Ticks.tag(), ticks.to_string())
    }

    pub fn timestamp(name: impl Into<String>, instant: &DateTime<Utc>) -> Self {
        Self::ticks(name, ticks_from_datetime(instant))
    }

    pub fn emit_if_empty(mut self, emit: bool) -> Self {
        self.emit_if_empty = emit;
        self
    }

    /// Build a spec from item metadata, where the type is given by which of the
    /// `String`, `Boolean` or `Ticks` keys is present (checked in that order)
    /// and `EmitIfEmpty` optionally carries a boolean. Keys match ignoring case.
    pub fn from_metadata(
        name: impl Into<String>,
        metadata: &BTreeMap<String, String>,
    ) -> Result<Self, GenerateError> {
        let name = name.into();
        let lookup = |key: &str| {
            metadata
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
        };

        let (field_type, value) = FieldType::all()
            .iter()
            .find_map(|t| lookup(t.tag()).map(|v| (*t, v)))
            .ok_or_else(|| GenerateError::InvalidFieldType {
                field: name.clone(),
                field_type: metadata.keys().cloned().collect::<Vec<_>>().join(","),
            })?;

        let emit_if_empty = match lookup(EMIT_IF_EMPTY_KEY) {
            Some(raw) => parse_bool(raw).ok_or_else(|| GenerateError::MalformedBooleanValue {
                field: name.clone(),
                value: raw.to_string(),
            })?,
            None => false,
        };

        Ok(Self::new(name, field_type.tag(), value).emit_if_empty(emit_if_empty))
    }

    /// Check the name and parse the raw value against the type tag.
    pub fn resolve(&self) -> Result<FieldDescriptor, GenerateError> {
        if self.name.trim().is_empty() {
            return Err(GenerateError::InvalidFieldName(self.name.clone()));
        }

        let field_type: FieldType = self.field_type.parse().map_err(|_| GenerateError::InvalidFieldType {
            field: self.name.clone(),
            field_type: self.field_type.clone(),
        })?;

        let value = match field_type {
            FieldType::String => FieldValue::String(self.value.clone()),
            FieldType::Boolean => FieldValue::Boolean(parse_bool(&self.value).ok_or_else(|| {
                GenerateError::MalformedBooleanValue {
                    field: self.name.clone(),
                    value: self.value.clone(),
                }
            })?),
            FieldType::Ticks => FieldValue::Ticks(parse_ticks(&self.value).ok_or_else(|| {
                GenerateError::MalformedTicksValue {
                    field: self.name.clone(),
                    value: self.value.clone(),
                }
            })?),
        };

        Ok(FieldDescriptor {
            name: self.name.clone(),
            value,
            emit_if_empty: self.emit_if_empty,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Boolean(bool),
    /// 100ns intervals since 0001-01-01T00:00:00Z.
    Ticks(i64),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::String(_) => FieldType::String,
            Self::Boolean(_) => FieldType::Boolean,
            Self::Ticks(_) => FieldType::Ticks,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Ticks(_) => ValueKind::Runtime,
            Self::String(_) | Self::Boolean(_) => ValueKind::Constant,
        }
    }

    /// Only strings can be empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Ticks(ticks) => datetime_from_ticks(*ticks),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub value: FieldValue,
    pub emit_if_empty: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
            emit_if_empty: false,
        }
    }

    /// Built-in members that are always emitted.
    pub(crate) fn always(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
            emit_if_empty: true,
        }
    }

    pub fn should_emit(&self) -> bool {
        self.emit_if_empty || !self.value.is_empty()
    }

    pub fn render(&self, dialect: &Dialect) -> RenderedField {
        let literal = match &self.value {
            FieldValue::String(s) => dialect.string_literal(s),
            FieldValue::Boolean(b) => dialect.bool_literal(*b).to_string(),
            FieldValue::Ticks(ticks) => dialect.date_time_literal(*ticks),
        };

        RenderedField {
            name: self.name.clone(),
            literal,
            field_type: self.value.field_type(),
            kind: self.value.kind(),
            should_emit: self.should_emit(),
        }
    }
}

/// One field as it will appear in a given dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField {
    pub name: String,
    pub literal: String,
    pub field_type: FieldType,
    pub kind: ValueKind,
    pub should_emit: bool,
}

fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_ticks(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|t| (0..=MAX_TICKS).contains(t))
}

/// Out-of-range instants saturate and are rejected when the field resolves.
pub fn ticks_from_datetime(instant: &DateTime<Utc>) -> i64 {
    instant
        .timestamp()
        .saturating_mul(TICKS_PER_SECOND)
        .saturating_add(UNIX_EPOCH_TICKS)
        .saturating_add(i64::from(instant.timestamp_subsec_nanos() / 100))
}

pub fn datetime_from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    if !(0..=MAX_TICKS).contains(&ticks) {
        return None;
    }
    let since_unix = ticks - UNIX_EPOCH_TICKS;
    let secs = since_unix.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_unix.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}
