//! To-do items and the persistence trait behind them.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// One entry of the to-do list.
///
/// `completed_at` is present iff `completed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub task: String,

    #[serde(with = "minute_format")]
    pub added: NaiveDateTime,

    #[serde(default)]
    pub completed: bool,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "minute_format::option"
    )]
    pub completed_at: Option<NaiveDateTime>,
}

impl TodoItem {
    /// A fresh, open item stamped with the current minute.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            added: now_to_minute(),
            completed: false,
            completed_at: None,
        }
    }

    /// Mark the item done. Returns `false` (and changes nothing) when it
    /// was already completed.
    pub fn complete(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(now_to_minute());
        true
    }

    pub fn glyph(&self) -> char {
        if self.completed { '✓' } else { '☐' }
    }
}

/// Local wall-clock time truncated to the minute, the precision the
/// persisted format carries.
pub fn now_to_minute() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Format a to-do timestamp the way it is persisted and shown.
pub fn format_minute(ts: &NaiveDateTime) -> String {
    ts.format(minute_format::FORMAT).to_string()
}

/// Durable storage for the to-do list.
///
/// Implementations overwrite the whole list on every save. Absence of
/// stored data is not an error: `load` returns `Ok(None)`.
pub trait TodoStore: Send + Sync {
    /// A short name for logs (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    fn save(&self, items: &[TodoItem]) -> Result<(), PersistenceError>;

    fn load(&self) -> Result<Option<Vec<TodoItem>>, PersistenceError>;

    /// Drop stored data. Removing something that does not exist succeeds.
    fn remove(&self) -> Result<(), PersistenceError>;
}

/// `YYYY-MM-DD HH:MM` serde adapter for `NaiveDateTime`.
pub mod minute_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::FORMAT;
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => s.serialize_str(&ts.format(FORMAT).to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| NaiveDateTime::parse_from_str(&raw, FORMAT))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_is_open() {
        let item = TodoItem::new("buy milk");
        assert!(!item.completed);
        assert!(item.completed_at.is_none());
        assert_eq!(item.added.second(), 0);
        assert_eq!(item.glyph(), '☐');
    }

    #[test]
    fn complete_is_idempotent() {
        let mut item = TodoItem::new("buy milk");
        assert!(item.complete());
        let stamp = item.completed_at;
        assert!(stamp.is_some());
        assert!(!item.complete());
        assert_eq!(item.completed_at, stamp);
        assert_eq!(item.glyph(), '✓');
    }

    #[test]
    fn serializes_in_minute_format() {
        let item = TodoItem {
            task: "write report".into(),
            added: NaiveDateTime::parse_from_str("2024-03-05 09:07", minute_format::FORMAT)
                .unwrap(),
            completed: false,
            completed_at: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["added"], "2024-03-05 09:07");
        assert!(json.get("completed_at").is_none());
    }

    #[test]
    fn deserializes_file_written_by_older_sessions() {
        let raw = r#"{"task":"call mom","added":"2024-01-02 18:30","completed":true,"completed_at":"2024-01-03 08:00"}"#;
        let item: TodoItem = serde_json::from_str(raw).unwrap();
        assert!(item.completed);
        assert_eq!(format_minute(&item.completed_at.unwrap()), "2024-01-03 08:00");
    }

    #[test]
    fn rejects_bad_timestamp() {
        let raw = r#"{"task":"x","added":"yesterday","completed":false}"#;
        assert!(serde_json::from_str::<TodoItem>(raw).is_err());
    }
}
