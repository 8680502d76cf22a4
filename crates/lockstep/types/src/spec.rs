//! Declarative specification items
//!
//! One item describes one integration the user wants configured. Loading
//! and validating the configuration medium that carries these is someone
//! else's job; the engine consumes an ordered slice of them.

use crate::answers::AnswerMap;
use crate::ids::ConfigurationId;
use serde::{Deserialize, Serialize};

/// One desired integration from the declarative specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSpec {
    /// Which integration/driver to instantiate.
    pub platform: String,
    /// Stable user-assigned identity, unique within the specification.
    pub configuration_id: ConfigurationId,
    /// Answer sets for the creation flow, one per expected step.
    pub answers: Vec<AnswerMap>,
    /// Answer sets for the options flow. Absent means "do not touch
    /// options"; an empty sequence is an explicit (empty) configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<AnswerMap>>,
    /// Whether an options change alone forces delete + recreate instead of
    /// an in-place options update.
    #[serde(default)]
    pub options_needs_recreate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_item_deserializes_with_defaults() {
        let item: IntegrationSpec = serde_json::from_value(json!({
            "platform": "p1",
            "configuration_id": "a",
            "answers": [{"host": "1.2.3.4"}],
        }))
        .unwrap();

        assert_eq!(item.platform, "p1");
        assert_eq!(item.configuration_id, ConfigurationId::new("a"));
        assert_eq!(item.answers.len(), 1);
        assert!(item.options.is_none());
        assert!(!item.options_needs_recreate);
    }

    #[test]
    fn test_empty_options_are_distinct_from_absent() {
        let item: IntegrationSpec = serde_json::from_value(json!({
            "platform": "p1",
            "configuration_id": "a",
            "answers": [],
            "options": [],
        }))
        .unwrap();

        assert_eq!(item.options, Some(vec![]));
    }
}
