//! Persisted record format for applied state
//!
//! Only what was actually applied survives a restart: the platform, the
//! externally assigned entry id, and the last config/options answer sets.
//! Desired state is re-derived from the specification on every pass and is
//! never persisted.

use crate::answers::AnswerMap;
use crate::ids::{ConfigurationId, ExternalId};
use serde::{Deserialize, Serialize};

/// One persisted managed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub platform: String,
    pub external_id: ExternalId,
    pub configuration_id: ConfigurationId,
    pub last_config: Option<Vec<AnswerMap>>,
    pub last_options: Option<Vec<AnswerMap>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_round_trip() {
        let record = EntryRecord {
            platform: "p1".into(),
            external_id: ExternalId::new("e1"),
            configuration_id: ConfigurationId::new("a"),
            last_config: Some(vec![AnswerMap::from([(
                "host".to_string(),
                json!("1.2.3.4"),
            )])]),
            last_options: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: EntryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
