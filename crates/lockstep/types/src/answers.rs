//! Answer maps supplied to interactive flows

use serde_json::Value;
use std::collections::BTreeMap;

/// One set of answers for one step of an interactive flow.
///
/// A user describes a whole flow as an ordered sequence of these maps, one
/// per expected step. Keys are field names; values are whatever JSON the
/// step's schema accepts. A map may carry more fields than a given step
/// declares — the driver filters it down before submission, so one blob can
/// serve several steps with different sub-schemas.
pub type AnswerMap = BTreeMap<String, Value>;
