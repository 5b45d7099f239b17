use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a lookup result or a saved row.
///
/// The lookup backend hands out numeric ids while persisted rows carry UUIDs,
/// so both forms are kept as they are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Number(value) => write!(f, "{value}"),
            EntryId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for EntryId {
    fn from(value: i64) -> Self {
        EntryId::Number(value)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        EntryId::Text(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        EntryId::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HskLevel {
    #[serde(default)]
    pub combined: u8,
    #[serde(default)]
    pub old: u8,
    #[serde(default)]
    pub new: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transcriptions {
    #[serde(default)]
    pub zhuyin: String,
    #[serde(default)]
    pub wadegiles: String,
}

/// One dictionary hit as returned by the lookup backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub id: EntryId,
    pub simplified: String,
    #[serde(default)]
    pub traditional: String,
    #[serde(default)]
    pub pinyin: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsk_level: Option<HskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
    #[serde(default)]
    pub parts_of_speech: Vec<String>,
    #[serde(default)]
    pub classifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcriptions: Option<Transcriptions>,
    #[serde(default)]
    pub meanings: Vec<String>,
}

impl LookupResult {
    /// Traditional form when it differs from the simplified one.
    pub fn distinct_traditional(&self) -> Option<&str> {
        let traditional = self.traditional.trim();
        (!traditional.is_empty() && traditional != self.simplified).then_some(traditional)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Chinese,
    Pinyin,
    English,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InputType::Chinese => "chinese",
            InputType::Pinyin => "pinyin",
            InputType::English => "english",
            InputType::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub input_type: InputType,
    #[serde(default)]
    pub results: Vec<LookupResult>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// A saved word as stored by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabEntry {
    pub id: String,
    pub user_id: String,
    pub simplified: String,
    #[serde(default)]
    pub traditional: Option<String>,
    #[serde(default)]
    pub pinyin: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub entry_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl VocabEntry {
    /// Presents a saved row in the same shape as a lookup hit.
    pub fn to_card(&self) -> LookupResult {
        let traditional = self
            .traditional
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or(&self.simplified)
            .to_string();
        LookupResult {
            id: EntryId::Text(self.id.clone()),
            simplified: self.simplified.clone(),
            traditional,
            pinyin: self.pinyin.clone().unwrap_or_default(),
            definition: self.definition.clone().unwrap_or_default(),
            hsk_level: None,
            frequency_rank: None,
            radical: None,
            match_type: Some("saved".to_string()),
            relevance_score: Some(1.0),
            parts_of_speech: Vec::new(),
            classifiers: Vec::new(),
            transcriptions: None,
            meanings: Vec::new(),
        }
    }
}

/// Fields a caller supplies when saving a word.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    #[serde(default)]
    pub simplified: String,
    #[serde(default)]
    pub traditional: Option<String>,
    #[serde(default)]
    pub pinyin: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "id")]
    pub entry_id: Option<EntryId>,
}

impl EntryDraft {
    pub fn new(simplified: impl Into<String>) -> Self {
        Self {
            simplified: simplified.into(),
            ..Self::default()
        }
    }

    pub fn simplified(&self) -> Option<&str> {
        let trimmed = self.simplified.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

impl From<&LookupResult> for EntryDraft {
    fn from(result: &LookupResult) -> Self {
        Self {
            simplified: result.simplified.clone(),
            traditional: non_empty(&result.traditional),
            pinyin: non_empty(&result.pinyin),
            definition: non_empty(&result.definition),
            notes: None,
            entry_id: Some(result.id.clone()),
        }
    }
}

/// Insert payload for one `vocab_entry` row.
///
/// Every field is serialized, `null` included, so all rows of a bulk insert
/// share one key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabRow {
    pub user_id: String,
    pub simplified: String,
    pub traditional: Option<String>,
    pub pinyin: Option<String>,
    pub definition: Option<String>,
    pub notes: Option<String>,
    pub entry_id: Option<String>,
}

impl VocabRow {
    /// Column list matching the serialized fields.
    pub const COLUMNS: &'static str =
        "user_id,simplified,traditional,pinyin,definition,notes,entry_id";

    pub fn from_draft(user_id: &str, simplified: &str, draft: &EntryDraft) -> Self {
        Self {
            user_id: user_id.to_string(),
            simplified: simplified.to_string(),
            traditional: draft.traditional.clone(),
            pinyin: draft.pinyin.clone(),
            definition: draft.definition.clone(),
            notes: draft.notes.clone(),
            entry_id: draft.entry_id.as_ref().map(|id| id.to_string()),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> serde_json::Value {
        json!({
            "input_type": "pinyin",
            "results": [{
                "id": 4021,
                "simplified": "你好",
                "traditional": "你好",
                "pinyin": "nǐ hǎo",
                "definition": "hello",
                "hsk_level": { "combined": 1, "old": 1, "new": 1 },
                "frequency_rank": 312,
                "radical": "亻",
                "match_type": "exact",
                "relevance_score": 0.98,
                "parts_of_speech": ["interjection"],
                "classifiers": [],
                "transcriptions": { "zhuyin": "ㄋㄧˇ ㄏㄠˇ", "wadegiles": "ni3 hao3" },
                "meanings": ["hello", "hi"]
            }],
            "pagination": { "page": 1, "page_size": 20, "total_count": 1, "total_pages": 1 }
        })
    }

    #[test]
    fn lookup_response_parses_backend_payload() {
        let response: LookupResponse = serde_json::from_value(sample_response()).unwrap();
        assert_eq!(response.input_type, InputType::Pinyin);
        assert_eq!(response.results.len(), 1);
        let hit = &response.results[0];
        assert_eq!(hit.id, EntryId::Number(4021));
        assert_eq!(hit.hsk_level.map(|level| level.combined), Some(1));
        assert_eq!(hit.distinct_traditional(), None);
        assert!(!response.pagination.has_next());
    }

    #[test]
    fn sparse_results_fill_defaults() {
        let hit: LookupResult =
            serde_json::from_value(json!({ "id": "abc", "simplified": "学" })).unwrap();
        assert_eq!(hit.id, EntryId::Text("abc".into()));
        assert!(hit.meanings.is_empty());
        assert!(hit.hsk_level.is_none());
        assert_eq!(hit.pinyin, "");
    }

    #[test]
    fn unknown_input_type_is_tolerated() {
        let response: LookupResponse =
            serde_json::from_value(json!({ "input_type": "cantonese", "results": [] })).unwrap();
        assert_eq!(response.input_type, InputType::Unknown);
    }

    #[test]
    fn saved_row_becomes_card_with_real_id() {
        let row = VocabEntry {
            id: "6f1c3a52-8e0b-4d7e-9a51-2c3f1d0e9b77".to_string(),
            user_id: "user-1".to_string(),
            simplified: "学习".to_string(),
            traditional: None,
            pinyin: Some("xué xí".to_string()),
            definition: None,
            notes: None,
            entry_id: Some("88".to_string()),
            created_at: Utc::now(),
            audio_url: None,
            image_url: None,
        };
        let card = row.to_card();
        assert_eq!(card.id, EntryId::Text(row.id.clone()));
        assert_eq!(card.traditional, "学习");
        assert_eq!(card.definition, "");
        assert_eq!(card.match_type.as_deref(), Some("saved"));
        assert_eq!(card.relevance_score, Some(1.0));
    }

    #[test]
    fn draft_from_result_keeps_lookup_id() {
        let response: LookupResponse = serde_json::from_value(sample_response()).unwrap();
        let draft = EntryDraft::from(&response.results[0]);
        assert_eq!(draft.simplified(), Some("你好"));
        assert_eq!(draft.entry_id, Some(EntryId::Number(4021)));
        let row = VocabRow::from_draft("user-1", "你好", &draft);
        assert_eq!(row.entry_id.as_deref(), Some("4021"));
    }

    #[test]
    fn rows_serialize_the_same_keys() {
        let full = VocabRow::from_draft("u", "猫", &EntryDraft {
            pinyin: Some("māo".to_string()),
            ..EntryDraft::new("猫")
        });
        let bare = VocabRow::from_draft("u", "狗", &EntryDraft::new("狗"));
        let keys = |row: &VocabRow| {
            serde_json::to_value(row)
                .unwrap()
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&full), keys(&bare));
        let mut columns: Vec<_> = VocabRow::COLUMNS.split(',').map(str::to_string).collect();
        columns.sort();
        let mut bare_keys = keys(&bare);
        bare_keys.sort();
        assert_eq!(bare_keys, columns);
        assert!(serde_json::to_value(&bare).unwrap()["pinyin"].is_null());
    }

    #[test]
    fn blank_simplified_is_missing() {
        assert_eq!(EntryDraft::new("   ").simplified(), None);
    }

    #[test]
    fn pagination_navigation_bounds() {
        let middle = Pagination {
            page: 2,
            page_size: 20,
            total_count: 55,
            total_pages: 3,
        };
        assert!(middle.has_previous());
        assert!(middle.has_next());
        let first = Pagination { page: 1, ..middle };
        assert!(!first.has_previous());
    }
}
