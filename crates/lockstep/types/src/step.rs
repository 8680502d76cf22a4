//! Flow step variants and step schemas
//!
//! A step-wise interactive flow hands back exactly one of three shapes after
//! init or after each answer submission: another form to fill in, a terminal
//! result, or a terminal abort. Modeling this as a tagged enum keeps the
//! driver free of key-probing on loosely shaped payloads.

use crate::answers::AnswerMap;
use crate::ids::ExternalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One step of an interactive flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowStep {
    /// The flow expects another set of answers.
    Form(FormStep),
    /// The flow finished and produced an entry.
    Finished(FlowReceipt),
    /// The flow terminated itself with a reason code.
    Aborted { reason: String },
}

/// An intermediate step: a schema to satisfy, plus any field errors the
/// protocol reported for the previous submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormStep {
    /// Protocol-assigned name of this step.
    pub step_id: String,
    /// The fields this step accepts.
    pub schema: StepSchema,
    /// Field errors, keyed by field name. Some integrations emit error
    /// markers with empty values on their first step; only non-empty values
    /// count as real errors.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl FormStep {
    /// Whether any reported error value is non-empty.
    pub fn has_blocking_errors(&self) -> bool {
        self.errors.values().any(|value| !value.is_empty())
    }
}

/// Terminal payload of a successful flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowReceipt {
    /// The entry the flow created or reconfigured.
    pub external_id: ExternalId,
    /// Human-readable entry title, if the protocol assigned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// The set of fields an intermediate step accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSchema {
    pub fields: Vec<FieldSpec>,
}

impl StepSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Filter an answer map down to exactly the fields this schema declares.
    /// Extra answer fields are dropped silently.
    pub fn select(&self, answers: &AnswerMap) -> AnswerMap {
        self.fields
            .iter()
            .filter_map(|field| {
                answers
                    .get(&field.name)
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect()
    }

    /// Compact field listing for diagnostics. Required fields are marked
    /// with a trailing `*`.
    pub fn describe(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                if field.required {
                    format!("{}*", field.name)
                } else {
                    field.name.clone()
                }
            })
            .collect();
        fields.join(", ")
    }
}

/// A single field of a step schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}
