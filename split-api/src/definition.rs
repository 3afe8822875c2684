//! Rollout definition wire model.
//!
//! A split definition is the configuration of one split inside one
//! environment: its treatments, the default distribution, and an ordered
//! list of targeting rules. The first matching rule wins, so rule order is
//! significant and is kept exactly as sent.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::{EnvironmentRef, TrafficTypeRef};

/// A split definition as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub environment: Option<EnvironmentRef>,
    #[serde(default)]
    pub traffic_type: Option<TrafficTypeRef>,
    #[serde(default)]
    pub killed: bool,
    #[serde(default)]
    pub treatments: Vec<Treatment>,
    #[serde(default)]
    pub default_treatment: String,
    #[serde(default)]
    pub traffic_allocation: Option<u8>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub default_rule: Vec<Bucket>,
    #[serde(default, alias = "creationTIme")]
    pub creation_time: Option<i64>,
    #[serde(default)]
    pub last_update_time: Option<i64>,
}

/// Body of a create or full update of a split definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDefinitionRequest {
    pub treatments: Vec<Treatment>,
    pub default_treatment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_allocation: Option<u8>,
    pub rules: Vec<Rule>,
    pub default_rule: Vec<Bucket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One state a split can resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    pub name: String,
    /// Opaque JSON payload, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configurations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Keys always served this treatment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    /// Segments always served this treatment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<String>>,
}

/// A share of traffic given to one treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub treatment: String,
    pub size: u32,
}

/// A condition and the distribution applied when it matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: Condition,
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

/// Matchers joined by a combiner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub combiner: Combiner,
    #[serde(default)]
    pub matchers: Vec<Matcher>,
}

/// How the matchers of a condition are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combiner {
    /// Every matcher must be satisfied.
    #[default]
    #[serde(rename = "AND")]
    And,
}

impl Combiner {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Combiner::And => "AND",
        }
    }

    /// Parse a wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AND" => Some(Combiner::And),
            _ => None,
        }
    }
}

/// Inclusive numeric or date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Between {
    pub from: i64,
    pub to: i64,
}

/// Dependency on the treatment another split resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub split_name: String,
    pub treatments: Vec<String>,
}

/// A single predicate over a key or one of its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatcherWire", into = "MatcherWire")]
pub struct Matcher {
    pub negate: bool,
    pub attribute: Option<String>,
    pub kind: MatcherKind,
}

/// Matcher type together with the one payload that type carries.
#[derive(Debug, Clone, PartialEq)]
pub enum MatcherKind {
    AllKeys,
    InSegment(String),
    InLargeSegment(String),
    InListString(Vec<String>),
    StartsWith(Vec<String>),
    EndsWith(Vec<String>),
    ContainsString(Vec<String>),
    MatchesString(String),
    EqualSet(Vec<String>),
    AnyOfSet(Vec<String>),
    AllOfSet(Vec<String>),
    PartOfSet(Vec<String>),
    EqualNumber(i64),
    GreaterThanOrEqualNumber(i64),
    LessThanOrEqualNumber(i64),
    BetweenNumber(Between),
    OnDate(i64),
    OnOrAfterDate(i64),
    OnOrBeforeDate(i64),
    BetweenDate(Between),
    EqualToBoolean(bool),
    InSplitTreatment(Dependency),
}

/// Every matcher type the API accepts.
pub const MATCHER_TYPES: &[&str] = &[
    "ALL_KEYS",
    "IN_SEGMENT",
    "IN_LARGE_SEGMENT",
    "IN_LIST_STRING",
    "STARTS_WITH_STRING",
    "ENDS_WITH_STRING",
    "CONTAINS_STRING",
    "MATCHES_STRING",
    "EQUAL_SET",
    "ANY_OF_SET",
    "ALL_OF_SET",
    "PART_OF_SET",
    "EQUAL_NUMBER",
    "GREATER_THAN_OR_EQUAL_NUMBER",
    "LESS_THAN_OR_EQUAL_NUMBER",
    "BETWEEN_NUMBER",
    "ON_DATE",
    "ON_OR_AFTER_DATE",
    "ON_OR_BEFORE_DATE",
    "BETWEEN_DATE",
    "EQUAL_TO_BOOLEAN",
    "IN_SPLIT_TREATMENT",
];

/// Payload field a matcher type reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherField {
    None,
    String,
    Strings,
    Number,
    Date,
    Bool,
    Between,
    Depends,
}

impl MatcherField {
    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherField::None => "none",
            MatcherField::String => "string",
            MatcherField::Strings => "strings",
            MatcherField::Number => "number",
            MatcherField::Date => "date",
            MatcherField::Bool => "bool",
            MatcherField::Between => "between",
            MatcherField::Depends => "depends",
        }
    }
}

/// Why a matcher could not be built from its flat form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatcherError {
    /// The type is not one the API knows.
    UnknownType(String),
    /// The type's payload field is absent.
    MissingField {
        matcher_type: &'static str,
        field: MatcherField,
    },
}

impl fmt::Display for MatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatcherError::UnknownType(t) => write!(f, "unknown matcher type {:?}", t),
            MatcherError::MissingField { matcher_type, field } => {
                write!(f, "matcher type {} requires the `{}` field", matcher_type, field.as_str())
            }
        }
    }
}

impl std::error::Error for MatcherError {}

impl MatcherKind {
    /// Wire type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            MatcherKind::AllKeys => "ALL_KEYS",
            MatcherKind::InSegment(_) => "IN_SEGMENT",
            MatcherKind::InLargeSegment(_) => "IN_LARGE_SEGMENT",
            MatcherKind::InListString(_) => "IN_LIST_STRING",
            MatcherKind::StartsWith(_) => "STARTS_WITH_STRING",
            MatcherKind::EndsWith(_) => "ENDS_WITH_STRING",
            MatcherKind::ContainsString(_) => "CONTAINS_STRING",
            MatcherKind::MatchesString(_) => "MATCHES_STRING",
            MatcherKind::EqualSet(_) => "EQUAL_SET",
            MatcherKind::AnyOfSet(_) => "ANY_OF_SET",
            MatcherKind::AllOfSet(_) => "ALL_OF_SET",
            MatcherKind::PartOfSet(_) => "PART_OF_SET",
            MatcherKind::EqualNumber(_) => "EQUAL_NUMBER",
            MatcherKind::GreaterThanOrEqualNumber(_) => "GREATER_THAN_OR_EQUAL_NUMBER",
            MatcherKind::LessThanOrEqualNumber(_) => "LESS_THAN_OR_EQUAL_NUMBER",
            MatcherKind::BetweenNumber(_) => "BETWEEN_NUMBER",
            MatcherKind::OnDate(_) => "ON_DATE",
            MatcherKind::OnOrAfterDate(_) => "ON_OR_AFTER_DATE",
            MatcherKind::OnOrBeforeDate(_) => "ON_OR_BEFORE_DATE",
            MatcherKind::BetweenDate(_) => "BETWEEN_DATE",
            MatcherKind::EqualToBoolean(_) => "EQUAL_TO_BOOLEAN",
            MatcherKind::InSplitTreatment(_) => "IN_SPLIT_TREATMENT",
        }
    }

    /// The payload field a wire type reads, if the type is known.
    pub fn field_for(matcher_type: &str) -> Option<MatcherField> {
        let field = match matcher_type {
            "ALL_KEYS" => MatcherField::None,
            "IN_SEGMENT" | "IN_LARGE_SEGMENT" | "MATCHES_STRING" => MatcherField::String,
            "IN_LIST_STRING" | "STARTS_WITH_STRING" | "ENDS_WITH_STRING" | "CONTAINS_STRING"
            | "EQUAL_SET" | "ANY_OF_SET" | "ALL_OF_SET" | "PART_OF_SET" => MatcherField::Strings,
            "EQUAL_NUMBER" | "GREATER_THAN_OR_EQUAL_NUMBER" | "LESS_THAN_OR_EQUAL_NUMBER" => {
                MatcherField::Number
            }
            "ON_DATE" | "ON_OR_AFTER_DATE" | "ON_OR_BEFORE_DATE" => MatcherField::Date,
            "BETWEEN_NUMBER" | "BETWEEN_DATE" => MatcherField::Between,
            "EQUAL_TO_BOOLEAN" => MatcherField::Bool,
            "IN_SPLIT_TREATMENT" => MatcherField::Depends,
            _ => return None,
        };
        Some(field)
    }

    /// Build a kind from a wire type and the payload fields of a flat matcher.
    ///
    /// Only the field the type reads is consulted; the others are ignored.
    pub fn from_parts(wire: &MatcherWire) -> Result<Self, MatcherError> {
        let field = Self::field_for(&wire.matcher_type)
            .ok_or_else(|| MatcherError::UnknownType(wire.matcher_type.clone()))?;
        let matcher_type = MATCHER_TYPES
            .iter()
            .copied()
            .find(|t| *t == wire.matcher_type)
            .unwrap_or("UNKNOWN");
        let missing = || MatcherError::MissingField { matcher_type, field };

        let string = || wire.string.clone().ok_or_else(missing);
        let strings = || wire.strings.clone().ok_or_else(missing);
        let number = || wire.number.ok_or_else(missing);
        let date = || wire.date.ok_or_else(missing);
        let between = || wire.between.ok_or_else(missing);

        let kind = match matcher_type {
            "ALL_KEYS" => MatcherKind::AllKeys,
            "IN_SEGMENT" => MatcherKind::InSegment(string()?),
            "IN_LARGE_SEGMENT" => MatcherKind::InLargeSegment(string()?),
            "MATCHES_STRING" => MatcherKind::MatchesString(string()?),
            "IN_LIST_STRING" => MatcherKind::InListString(strings()?),
            "STARTS_WITH_STRING" => MatcherKind::StartsWith(strings()?),
            "ENDS_WITH_STRING" => MatcherKind::EndsWith(strings()?),
            "CONTAINS_STRING" => MatcherKind::ContainsString(strings()?),
            "EQUAL_SET" => MatcherKind::EqualSet(strings()?),
            "ANY_OF_SET" => MatcherKind::AnyOfSet(strings()?),
            "ALL_OF_SET" => MatcherKind::AllOfSet(strings()?),
            "PART_OF_SET" => MatcherKind::PartOfSet(strings()?),
            "EQUAL_NUMBER" => MatcherKind::EqualNumber(number()?),
            "GREATER_THAN_OR_EQUAL_NUMBER" => MatcherKind::GreaterThanOrEqualNumber(number()?),
            "LESS_THAN_OR_EQUAL_NUMBER" => MatcherKind::LessThanOrEqualNumber(number()?),
            "BETWEEN_NUMBER" => MatcherKind::BetweenNumber(between()?),
            "ON_DATE" => MatcherKind::OnDate(date()?),
            "ON_OR_AFTER_DATE" => MatcherKind::OnOrAfterDate(date()?),
            "ON_OR_BEFORE_DATE" => MatcherKind::OnOrBeforeDate(date()?),
            "BETWEEN_DATE" => MatcherKind::BetweenDate(between()?),
            "EQUAL_TO_BOOLEAN" => MatcherKind::EqualToBoolean(wire.bool.ok_or_else(missing)?),
            "IN_SPLIT_TREATMENT" => {
                MatcherKind::InSplitTreatment(wire.depends.clone().ok_or_else(missing)?)
            }
            other => return Err(MatcherError::UnknownType(other.to_string())),
        };
        Ok(kind)
    }

    /// Write this kind's type and payload into an otherwise empty wire form.
    fn fill(self, wire: &mut MatcherWire) {
        wire.matcher_type = self.type_name().to_string();
        match self {
            MatcherKind::AllKeys => {}
            MatcherKind::InSegment(s)
            | MatcherKind::InLargeSegment(s)
            | MatcherKind::MatchesString(s) => wire.string = Some(s),
            MatcherKind::InListString(v)
            | MatcherKind::StartsWith(v)
            | MatcherKind::EndsWith(v)
            | MatcherKind::ContainsString(v)
            | MatcherKind::EqualSet(v)
            | MatcherKind::AnyOfSet(v)
            | MatcherKind::AllOfSet(v)
            | MatcherKind::PartOfSet(v) => wire.strings = Some(v),
            MatcherKind::EqualNumber(n)
            | MatcherKind::GreaterThanOrEqualNumber(n)
            | MatcherKind::LessThanOrEqualNumber(n) => wire.number = Some(n),
            MatcherKind::OnDate(d)
            | MatcherKind::OnOrAfterDate(d)
            | MatcherKind::OnOrBeforeDate(d) => wire.date = Some(d),
            MatcherKind::BetweenNumber(b) | MatcherKind::BetweenDate(b) => wire.between = Some(b),
            MatcherKind::EqualToBoolean(b) => wire.bool = Some(b),
            MatcherKind::InSplitTreatment(d) => wire.depends = Some(d),
        }
    }
}

/// Flat matcher as it appears on the wire: a type tag plus optional fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherWire {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,
    #[serde(rename = "type")]
    pub matcher_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<Between>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends: Option<Dependency>,
}

impl TryFrom<MatcherWire> for Matcher {
    type Error = MatcherError;

    fn try_from(wire: MatcherWire) -> Result<Self, Self::Error> {
        let kind = MatcherKind::from_parts(&wire)?;
        Ok(Matcher {
            negate: wire.negate,
            attribute: wire.attribute,
            kind,
        })
    }
}

impl From<Matcher> for MatcherWire {
    fn from(matcher: Matcher) -> Self {
        let mut wire = MatcherWire {
            negate: matcher.negate,
            attribute: matcher.attribute,
            ..MatcherWire::default()
        };
        matcher.kind.fill(&mut wire);
        wire
    }
}
