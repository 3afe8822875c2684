//! Flat rollout definition configuration and its codec.
//!
//! Users describe a definition as flat blocks: a list of treatments, a list
//! of default-rule buckets and a list of rules, each rule holding its
//! buckets and a single condition block of matchers. [`encode`] validates
//! that shape and builds the nested request body; [`decode`] turns a
//! definition read back from the API into the same flat shape.
//!
//! Encoding never touches the network, so every invariant below fails
//! before a request is sent.

use serde::{Deserialize, Serialize};
use split_api::{
    Between, Bucket, Combiner, Condition, Dependency, Matcher, MatcherError,
    MatcherWire, Rule, SplitDefinition, SplitDefinitionRequest, Treatment,
};
use std::collections::HashSet;
use thiserror::Error;

/// Total a distribution must add up to.
pub const FULL_DISTRIBUTION: u64 = 100;

/// Flat configuration of one split in one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitDefinitionConfig {
    pub workspace_id: String,
    pub split_name: String,
    pub environment_id: String,
    pub default_treatment: String,
    #[serde(default)]
    pub traffic_allocation: Option<u8>,
    #[serde(default, rename = "treatment", alias = "treatments")]
    pub treatments: Vec<TreatmentBlock>,
    #[serde(default)]
    pub default_rule: Vec<BucketBlock>,
    /// Evaluated in order; the first match wins.
    #[serde(default, rename = "rule", alias = "rules")]
    pub rules: Vec<RuleBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentBlock {
    pub name: String,
    /// JSON document handed to SDKs with the treatment.
    #[serde(default)]
    pub configurations: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    #[serde(default)]
    pub segments: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketBlock {
    pub treatment: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBlock {
    #[serde(default, rename = "bucket", alias = "buckets")]
    pub buckets: Vec<BucketBlock>,
    /// Exactly one block is accepted.
    #[serde(default, rename = "condition", alias = "conditions")]
    pub conditions: Vec<ConditionBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionBlock {
    #[serde(default = "default_combiner")]
    pub combiner: String,
    #[serde(default, rename = "matcher", alias = "matchers")]
    pub matchers: Vec<MatcherBlock>,
}

fn default_combiner() -> String {
    Combiner::And.as_str().to_string()
}

/// One matcher. Only the field read by `type` is sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherBlock {
    #[serde(rename = "type")]
    pub matcher_type: String,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub strings: Option<Vec<String>>,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub bool: Option<bool>,
    #[serde(default)]
    pub between: Option<BetweenBlock>,
    #[serde(default)]
    pub depends: Option<DependsBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetweenBlock {
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependsBlock {
    pub split_name: String,
    pub treatments: Vec<String>,
}

/// A rollout definition invariant that does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("at least one treatment is required")]
    NoTreatments,

    #[error("treatment {name:?} is declared more than once")]
    DuplicateTreatment { name: String },

    #[error("configurations of treatment {treatment:?} are not valid JSON: {message}")]
    InvalidConfigurations { treatment: String, message: String },

    #[error("default treatment {name:?} is not one of the declared treatments")]
    UnknownDefaultTreatment { name: String },

    #[error("traffic allocation must be between 0 and 100, got {value}")]
    TrafficAllocationOutOfRange { value: u8 },

    #[error("default rule sizes must add up to 100, got {sum}")]
    DefaultRuleSizeMismatch { sum: u64 },

    #[error("bucket treatment {treatment:?} is not one of the declared treatments")]
    UnknownBucketTreatment { treatment: String },

    #[error("rule {rule} bucket sizes must add up to 100, got {sum}")]
    RuleSizeMismatch { rule: usize, sum: u64 },

    #[error("rule {rule} has no condition")]
    MissingCondition { rule: usize },

    #[error("rule {rule} has {count} conditions, only one is supported")]
    MultipleConditions { rule: usize, count: usize },

    #[error("rule {rule} uses combiner {combiner:?}, only AND is supported")]
    UnsupportedCombiner { rule: usize, combiner: String },

    #[error("rule {rule} matcher {matcher} has unknown type {matcher_type:?}")]
    UnknownMatcherType {
        rule: usize,
        matcher: usize,
        matcher_type: String,
    },

    #[error("rule {rule} matcher {matcher} of type {matcher_type} requires the `{field}` field")]
    MissingMatcherField {
        rule: usize,
        matcher: usize,
        matcher_type: &'static str,
        field: &'static str,
    },
}

/// Validate a flat definition and build the request body sent on create and update.
///
/// Checks run in a fixed order and the first violation is returned.
pub fn encode(config: &SplitDefinitionConfig) -> Result<SplitDefinitionRequest, DefinitionError> {
    let treatments = encode_treatments(&config.treatments)?;
    let names: HashSet<&str> = treatments.iter().map(|t| t.name.as_str()).collect();

    if !names.contains(config.default_treatment.as_str()) {
        return Err(DefinitionError::UnknownDefaultTreatment {
            name: config.default_treatment.clone(),
        });
    }

    if let Some(value) = config.traffic_allocation
        && u64::from(value) > FULL_DISTRIBUTION
    {
        return Err(DefinitionError::TrafficAllocationOutOfRange { value });
    }

    let sum = bucket_sum(&config.default_rule);
    if sum != FULL_DISTRIBUTION {
        return Err(DefinitionError::DefaultRuleSizeMismatch { sum });
    }

    let every_bucket = config
        .default_rule
        .iter()
        .chain(config.rules.iter().flat_map(|r| r.buckets.iter()));
    for bucket in every_bucket {
        if !names.contains(bucket.treatment.as_str()) {
            return Err(DefinitionError::UnknownBucketTreatment {
                treatment: bucket.treatment.clone(),
            });
        }
    }

    let rules = config
        .rules
        .iter()
        .enumerate()
        .map(|(index, rule)| encode_rule(index, rule))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SplitDefinitionRequest {
        treatments,
        default_treatment: config.default_treatment.clone(),
        traffic_allocation: config.traffic_allocation,
        rules,
        default_rule: encode_buckets(&config.default_rule),
        comment: None,
    })
}

fn encode_treatments(blocks: &[TreatmentBlock]) -> Result<Vec<Treatment>, DefinitionError> {
    if blocks.is_empty() {
        return Err(DefinitionError::NoTreatments);
    }

    let mut seen = HashSet::new();
    let mut treatments = Vec::with_capacity(blocks.len());

    for block in blocks {
        if !seen.insert(block.name.as_str()) {
            return Err(DefinitionError::DuplicateTreatment {
                name: block.name.clone(),
            });
        }

        let configurations = non_empty_string(&block.configurations);
        if let Some(raw) = &configurations {
            serde_json::from_str::<serde_json::Value>(raw).map_err(|e| {
                DefinitionError::InvalidConfigurations {
                    treatment: block.name.clone(),
                    message: e.to_string(),
                }
            })?;
        }

        treatments.push(Treatment {
            name: block.name.clone(),
            configurations,
            description: block.description.clone(),
            keys: non_empty_list(&block.keys),
            segments: non_empty_list(&block.segments),
        });
    }

    Ok(treatments)
}

fn encode_rule(index: usize, rule: &RuleBlock) -> Result<Rule, DefinitionError> {
    let sum = bucket_sum(&rule.buckets);
    if sum != FULL_DISTRIBUTION {
        return Err(DefinitionError::RuleSizeMismatch { rule: index, sum });
    }

    let condition = match rule.conditions.as_slice() {
        [] => return Err(DefinitionError::MissingCondition { rule: index }),
        [condition] => condition,
        more => {
            return Err(DefinitionError::MultipleConditions {
                rule: index,
                count: more.len(),
            });
        }
    };

    let combiner =
        Combiner::parse(&condition.combiner).ok_or_else(|| DefinitionError::UnsupportedCombiner {
            rule: index,
            combiner: condition.combiner.clone(),
        })?;

    let matchers = condition
        .matchers
        .iter()
        .enumerate()
        .map(|(position, block)| encode_matcher(index, position, block))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Rule {
        condition: Condition { combiner, matchers },
        buckets: encode_buckets(&rule.buckets),
    })
}

fn encode_matcher(
    rule: usize,
    position: usize,
    block: &MatcherBlock,
) -> Result<Matcher, DefinitionError> {
    let wire = MatcherWire {
        negate: block.negate,
        matcher_type: block.matcher_type.clone(),
        attribute: block.attribute.clone(),
        string: block.string.clone(),
        bool: block.bool,
        strings: block.strings.clone(),
        number: block.number,
        date: block.date,
        between: block.between.map(|b| Between { from: b.from, to: b.to }),
        depends: block.depends.as_ref().map(|d| Dependency {
            split_name: d.split_name.clone(),
            treatments: d.treatments.clone(),
        }),
    };

    Matcher::try_from(wire).map_err(|e| match e {
        MatcherError::UnknownType(matcher_type) => DefinitionError::UnknownMatcherType {
            rule,
            matcher: position,
            matcher_type,
        },
        MatcherError::MissingField { matcher_type, field } => DefinitionError::MissingMatcherField {
            rule,
            matcher: position,
            matcher_type,
            field: field.as_str(),
        },
    })
}

fn encode_buckets(blocks: &[BucketBlock]) -> Vec<Bucket> {
    blocks
        .iter()
        .map(|b| Bucket {
            treatment: b.treatment.clone(),
            size: b.size,
        })
        .collect()
}

fn bucket_sum(blocks: &[BucketBlock]) -> u64 {
    blocks.iter().map(|b| u64::from(b.size)).sum()
}

/// Turn a definition read from the API into its flat configuration.
pub fn decode(workspace_id: &str, definition: &SplitDefinition) -> SplitDefinitionConfig {
    let environment_id = definition
        .environment
        .as_ref()
        .map(|e| e.id.clone())
        .unwrap_or_default();

    SplitDefinitionConfig {
        workspace_id: workspace_id.to_string(),
        split_name: definition.name.clone(),
        environment_id,
        default_treatment: definition.default_treatment.clone(),
        traffic_allocation: definition.traffic_allocation,
        treatments: definition.treatments.iter().map(decode_treatment).collect(),
        default_rule: decode_buckets(&definition.default_rule),
        rules: definition.rules.iter().map(decode_rule).collect(),
    }
}

fn decode_treatment(treatment: &Treatment) -> TreatmentBlock {
    TreatmentBlock {
        name: treatment.name.clone(),
        configurations: non_empty_string(&treatment.configurations),
        description: treatment.description.clone(),
        keys: non_empty_list(&treatment.keys),
        segments: non_empty_list(&treatment.segments),
    }
}

fn decode_rule(rule: &Rule) -> RuleBlock {
    RuleBlock {
        buckets: decode_buckets(&rule.buckets),
        conditions: vec![ConditionBlock {
            combiner: rule.condition.combiner.as_str().to_string(),
            matchers: rule.condition.matchers.iter().map(decode_matcher).collect(),
        }],
    }
}

fn decode_matcher(matcher: &Matcher) -> MatcherBlock {
    let wire = MatcherWire::from(matcher.clone());
    MatcherBlock {
        matcher_type: wire.matcher_type,
        attribute: wire.attribute,
        negate: wire.negate,
        string: wire.string,
        strings: wire.strings,
        number: wire.number,
        date: wire.date,
        bool: wire.bool,
        between: wire.between.map(|b| BetweenBlock { from: b.from, to: b.to }),
        depends: wire.depends.map(|d| DependsBlock {
            split_name: d.split_name,
            treatments: d.treatments,
        }),
    }
}

fn decode_buckets(buckets: &[Bucket]) -> Vec<BucketBlock> {
    buckets
        .iter()
        .map(|b| BucketBlock {
            treatment: b.treatment.clone(),
            size: b.size,
        })
        .collect()
}

fn non_empty_list(list: &Option<Vec<String>>) -> Option<Vec<String>> {
    list.as_ref().filter(|l| !l.is_empty()).cloned()
}

fn non_empty_string(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
