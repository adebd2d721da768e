//! Persisted question/answer store.
//!
//! [`KnowledgeStore`] owns the whole [`KnowledgeFile`] in memory and rewrites
//! it to disk after every mutation. Loading never fails: a missing or
//! unreadable file yields an empty store.
//!
//! The store does no file locking. Two stores opened on the same path each
//! keep their own copy, and whichever saves last wins.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::knowledge::similarity::{
    extract_keywords, similarity_score, LOOKUP_THRESHOLD, MERGE_THRESHOLD,
};
use crate::knowledge::types::{
    ExportEntry, KnowledgeFile, LearnedMatch, QaRecord, RecordOutcome, StatsResponse,
};

const ID_PREFIX: &str = "qa_";

#[derive(Debug)]
pub struct KnowledgeStore {
    path: PathBuf,
    data: KnowledgeFile,
}

impl KnowledgeStore {
    /// Open the store at `path`, creating its parent directory if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path)?;
        let data = load(&path);
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.data.learned_qa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.learned_qa.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&QaRecord> {
        self.data
            .learned_qa
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, r)| r)
    }

    /// Re-read the file, discarding in-memory state.
    pub fn reload(&mut self) {
        self.data = load(&self.path);
    }

    /// Write the full store to disk (tmp file + rename).
    pub fn save(&self) -> Result<()> {
        ensure_parent_dir(&self.path)?;

        let json =
            serde_json::to_string_pretty(&self.data).context("failed to serialize knowledge base")?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), records = self.len(), "knowledge base saved");
        Ok(())
    }

    /// Learn from one exchange: merge into the first record scoring above
    /// [`MERGE_THRESHOLD`], or insert a new one. Always adds 2 to the message
    /// total and saves.
    pub fn record_conversation(
        &mut self,
        user_message: &str,
        bot_response: &str,
    ) -> Result<RecordOutcome> {
        let keywords = extract_keywords(user_message);
        let now = chrono::Utc::now().to_rfc3339();

        // First match wins, not best match.
        let existing = self
            .data
            .learned_qa
            .iter()
            .position(|(_, qa)| similarity_score(user_message, &qa.question) > MERGE_THRESHOLD);

        let outcome = match existing {
            Some(idx) => {
                let (id, qa) = &mut self.data.learned_qa[idx];
                qa.count += 1;
                qa.last_updated = now;
                RecordOutcome {
                    id: id.clone(),
                    merged: true,
                }
            }
            None => {
                let id = self.next_id();
                self.data.learned_qa.push((
                    id.clone(),
                    QaRecord {
                        question: user_message.to_string(),
                        response: bot_response.to_string(),
                        keywords,
                        count: 1,
                        created: now.clone(),
                        last_updated: now,
                    },
                ));
                RecordOutcome { id, merged: false }
            }
        };

        self.data.stats.total_messages += 2;
        self.save()?;

        tracing::debug!(id = %outcome.id, merged = outcome.merged, "conversation recorded");
        Ok(outcome)
    }

    /// Best-scoring record above [`LOOKUP_THRESHOLD`]. Ties go to the record
    /// seen first.
    pub fn find_learned_response(&self, user_message: &str) -> Option<LearnedMatch> {
        let mut best: Option<(&String, &QaRecord, f64)> = None;
        let mut best_score = LOOKUP_THRESHOLD;

        for (id, qa) in &self.data.learned_qa {
            let score = similarity_score(user_message, &qa.question);
            if score > best_score {
                best_score = score;
                best = Some((id, qa, score));
            }
        }

        best.map(|(id, record, score)| LearnedMatch {
            id: id.clone(),
            record: record.clone(),
            score,
        })
    }

    pub fn get_stats(&self) -> StatsResponse {
        StatsResponse {
            total_learned_qa: self.data.learned_qa.len() as u64,
            total_messages: self.data.stats.total_messages,
            total_conversations: self.data.conversations.len() as u64,
        }
    }

    /// Every record as `{Q, A, Uses}`, most used first. The sort is stable,
    /// so equal counts keep insertion order.
    pub fn export_all(&self) -> Vec<ExportEntry> {
        let mut entries: Vec<ExportEntry> = self
            .data
            .learned_qa
            .iter()
            .map(|(_, qa)| ExportEntry {
                question: qa.question.clone(),
                answer: qa.response.clone(),
                uses: qa.count,
            })
            .collect();
        entries.sort_by(|a, b| b.uses.cmp(&a.uses));
        entries
    }

    /// One past the largest numeric id suffix, so ids are never reused.
    fn next_id(&self) -> String {
        let max = self
            .data
            .learned_qa
            .iter()
            .filter_map(|(id, _)| id.strip_prefix(ID_PREFIX)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let next = max.max(self.data.learned_qa.len() as u64) + 1;
        format!("{ID_PREFIX}{next}")
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Read the store file, falling back to an empty store on any failure.
fn load(path: &Path) -> KnowledgeFile {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no knowledge base yet, starting empty");
            return KnowledgeFile::default();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read knowledge base, starting empty");
            return KnowledgeFile::default();
        }
    };

    match serde_json::from_str::<KnowledgeFile>(&contents) {
        Ok(data) => {
            tracing::info!(
                path = %path.display(),
                records = data.learned_qa.len(),
                "knowledge base loaded"
            );
            data
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "knowledge base is corrupt, starting empty");
            KnowledgeFile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, KnowledgeStore) {
        let tmp = TempDir::new().unwrap();
        let store = KnowledgeStore::open(tmp.path().join("kb.json")).unwrap();
        (tmp, store)
    }

    #[test]
    fn test_insert_new_record() {
        let (_tmp, mut store) = test_store();

        let outcome = store
            .record_conversation("Tell me about Rust programming", "Rust is a language")
            .unwrap();

        assert!(!outcome.merged);
        assert_eq!(outcome.id, "qa_1");
        let record = store.get("qa_1").unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.response, "Rust is a language");
        assert_eq!(record.keywords, vec!["tell", "about", "rust", "programming"]);
        assert_eq!(record.created, record.last_updated);
        assert_eq!(store.get_stats().total_messages, 2);
    }

    #[test]
    fn test_repeat_message_merges() {
        let (_tmp, mut store) = test_store();

        store.record_conversation("Hello", "Hello! How can I help you today?").unwrap();
        let second = store.record_conversation("Hello", "something else").unwrap();

        assert!(second.merged);
        assert_eq!(second.id, "qa_1");
        assert_eq!(store.len(), 1);
        let record = store.get("qa_1").unwrap();
        assert_eq!(record.count, 2);
        // stored response is not replaced by a merge
        assert_eq!(record.response, "Hello! How can I help you today?");
        assert_eq!(store.get_stats().total_messages, 4);
    }

    const CORE: &str = "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10";

    #[test]
    fn test_merge_takes_first_match_not_best() {
        let (_tmp, mut store) = test_store();
        // Two records that do not merge with each other (10/15)
        store.record_conversation(&format!("{CORE} x1 x2 x3 x4"), "first").unwrap();
        store.record_conversation(&format!("{CORE} y1"), "second").unwrap();
        assert_eq!(store.len(), 2);

        // vs qa_1: 10/14 ; vs qa_2: 10/11. Both clear 0.7, qa_1 is seen first.
        let outcome = store.record_conversation(CORE, "x").unwrap();
        assert!(outcome.merged);
        assert_eq!(outcome.id, "qa_1");
        assert_eq!(store.get("qa_1").unwrap().count, 2);
        assert_eq!(store.get("qa_2").unwrap().count, 1);
    }

    #[test]
    fn test_merge_threshold_is_strict() {
        let (_tmp, mut store) = test_store();
        // {a b c d e f g h i j} vs {a b c d e f g} => 7/10 = 0.7 exactly
        store.record_conversation("a b c d e f g h i j", "r").unwrap();
        let outcome = store.record_conversation("a b c d e f g", "r").unwrap();
        assert!(!outcome.merged);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_lookup_picks_best_above_threshold() {
        let (_tmp, mut store) = test_store();
        store.record_conversation(&format!("{CORE} x1 x2 x3 x4"), "first").unwrap();
        store.record_conversation(&format!("{CORE} y1"), "second").unwrap();

        // Same probe as the merge test, but lookup takes the best score.
        let hit = store.find_learned_response(CORE).unwrap();
        assert_eq!(hit.id, "qa_2");
        assert!((hit.score - 10.0 / 11.0).abs() < 1e-9);
        assert_eq!(hit.record.response, "second");
    }

    #[test]
    fn test_lookup_threshold_is_strict() {
        let (_tmp, mut store) = test_store();
        // {a b c d e} vs {a b c} => 3/5 = 0.6 exactly
        store.record_conversation("a b c d e", "r").unwrap();
        assert!(store.find_learned_response("a b c").is_none());
        assert!(store.find_learned_response("a b c d").is_some());
    }

    #[test]
    fn test_lookup_has_no_side_effects() {
        let (_tmp, mut store) = test_store();
        store.record_conversation("Hello", "Hi").unwrap();
        let _ = store.find_learned_response("Hello");
        assert_eq!(store.get("qa_1").unwrap().count, 1);
        assert_eq!(store.get_stats().total_messages, 2);
    }

    #[test]
    fn test_lookup_tie_goes_to_first() {
        let (tmp, _) = test_store();
        let path = tmp.path().join("tie.json");
        std::fs::write(
            &path,
            r#"{"learned_qa": {
                "qa_1": {"question": "cats dogs", "response": "first", "count": 1},
                "qa_2": {"question": "cats dogs", "response": "second", "count": 1}
            }}"#,
        )
        .unwrap();
        let store = KnowledgeStore::open(&path).unwrap();
        let hit = store.find_learned_response("cats dogs").unwrap();
        assert_eq!(hit.record.response, "first");
    }

    #[test]
    fn test_next_id_skips_past_existing() {
        let (tmp, _) = test_store();
        let path = tmp.path().join("gap.json");
        std::fs::write(
            &path,
            r#"{"learned_qa": {"qa_7": {"question": "seven", "response": "r", "count": 1}}}"#,
        )
        .unwrap();
        let mut store = KnowledgeStore::open(&path).unwrap();
        let outcome = store.record_conversation("something different", "r").unwrap();
        assert_eq!(outcome.id, "qa_8");
    }

    #[test]
    fn test_export_sorted_by_uses() {
        let (_tmp, mut store) = test_store();
        store.record_conversation("rare question here", "a").unwrap();
        for _ in 0..3 {
            store.record_conversation("popular question", "b").unwrap();
        }
        store.record_conversation("another rare one", "c").unwrap();

        let export = store.export_all();
        let uses: Vec<u64> = export.iter().map(|e| e.uses).collect();
        assert_eq!(uses, vec![3, 1, 1]);
        assert_eq!(export[0].question, "popular question");
        // equal counts keep insertion order
        assert_eq!(export[1].question, "rare question here");
        assert_eq!(export[2].question, "another rare one");
    }

    #[test]
    fn test_stats_conversations_always_zero() {
        let (_tmp, mut store) = test_store();
        store.record_conversation("hello", "hi").unwrap();
        store.record_conversation("bye now", "bye").unwrap();
        let stats = store.get_stats();
        assert_eq!(stats.total_learned_qa, 2);
        assert_eq!(stats.total_messages, 4);
        assert_eq!(stats.total_conversations, 0);
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let (tmp, mut store) = test_store();
        store.record_conversation("hello", "hi").unwrap();
        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["kb.json".to_string()]);
    }
}
