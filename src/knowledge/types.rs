//! Knowledge store type definitions.
//!
//! Defines [`QaRecord`] (one learned question/answer pair), [`KnowledgeFile`]
//! (the on-disk document), and the projections served by stats and export.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A learned question/answer pair, matching one entry of `learned_qa`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    /// The user message exactly as it was received.
    pub question: String,
    /// The reply stored when the record was created. Never re-derived.
    pub response: String,
    /// Up to five lowercase tokens from `question`. Informational only.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Number of times an incoming message merged into this record. Starts at 1.
    pub count: u64,
    /// RFC 3339 creation timestamp.
    #[serde(default)]
    pub created: String,
    /// RFC 3339 timestamp of the last merge.
    #[serde(default)]
    pub last_updated: String,
}

/// Aggregate counters persisted alongside the records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreStats {
    /// Incremented by 2 per conversation turn (one user + one bot message).
    pub total_messages: u64,
    /// Carried through load/save; nothing increments it.
    pub total_conversations: u64,
}

/// The whole persisted document, `data/knowledge_base.json` by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeFile {
    /// Declared by the file format but never populated by the chat flow.
    pub conversations: Vec<serde_json::Value>,
    /// Records keyed by id, kept in document/insertion order.
    #[serde(with = "ordered_records")]
    pub learned_qa: Vec<(String, QaRecord)>,
    pub stats: StoreStats,
}

/// Response from `get_stats`, also the `GET /api/stats` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_learned_qa: u64,
    pub total_messages: u64,
    pub total_conversations: u64,
}

/// One row of `export_all`, serialized with the `{Q, A, Uses}` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    #[serde(rename = "Q")]
    pub question: String,
    #[serde(rename = "A")]
    pub answer: String,
    #[serde(rename = "Uses")]
    pub uses: u64,
}

/// Outcome of `record_conversation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    /// Id of the record that was inserted or merged into.
    pub id: String,
    /// `true` if an existing record's count was bumped instead of inserting.
    pub merged: bool,
}

/// A lookup hit from `find_learned_response`.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnedMatch {
    pub id: String,
    pub record: QaRecord,
    pub score: f64,
}

/// Serde adapter that reads and writes `learned_qa` as a JSON object while
/// keeping entries in the order they appear.
mod ordered_records {
    use super::*;

    pub fn serialize<S>(records: &[(String, QaRecord)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(records.len()))?;
        for (id, record) in records {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, QaRecord)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordsVisitor)
    }

    struct RecordsVisitor;

    impl<'de> Visitor<'de> for RecordsVisitor {
        type Value = Vec<(String, QaRecord)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of record id to question/answer record")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut records = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((id, record)) = access.next_entry::<String, QaRecord>()? {
                // A repeated key replaces the earlier value in place.
                if let Some(slot) = records.iter_mut().find(|(k, _)| *k == id) {
                    slot.1 = record;
                } else {
                    records.push((id, record));
                }
            }
            Ok(records)
        }
    }
}
