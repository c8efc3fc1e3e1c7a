//! Wire and domain types served by the todo store.
//!
//! # Design
//! One `Todo` type is shared by both backends. Timestamps are optional because
//! only the persistent backend tracks them; they are omitted from the JSON
//! body when absent so in-memory responses stay `{id, title, completed}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single todo item as stored and served.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
}

/// Partial update. Only the fields present in the body are applied.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// Aggregate counters over the whole collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: u64,
    pub completed: u64,
    pub active: u64,
    /// Percentage of completed items, rounded to two decimals; 0 when empty.
    pub completion_rate: f64,
}

impl Stats {
    pub fn new(total: u64, completed: u64) -> Self {
        let completion_rate = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };
        Stats {
            total,
            completed,
            active: total - completed,
            completion_rate,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl Health {
    pub fn ok() -> Self {
        Health {
            status: "ok".to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_without_timestamps_omits_them() {
        let todo = Todo {
            id: 7,
            title: "Test".to_string(),
            completed: false,
            created_at: None,
            updated_at: None,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "Test");
        assert_eq!(json["completed"], false);
        assert!(json.get("createdAt").is_none());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn todo_timestamps_use_camel_case() {
        let now = Utc::now();
        let todo = Todo {
            id: 1,
            title: "Stamped".to_string(),
            completed: true,
            created_at: Some(now),
            updated_at: Some(now),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn create_todo_rejects_missing_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"completed":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_partial_fields() {
        let input: UpdateTodo = serde_json::from_str(r#"{"title":"New title"}"#).unwrap();
        assert_eq!(input.title.as_deref(), Some("New title"));
        assert!(input.completed.is_none());

        let input: UpdateTodo = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.title.is_none());
        assert!(input.completed.is_none());
    }

    #[test]
    fn stats_of_empty_collection_has_zero_rate() {
        let stats = Stats::new(0, 0);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn stats_rate_is_rounded_to_two_decimals() {
        let stats = Stats::new(3, 1);
        assert_eq!(stats.completed + stats.active, stats.total);
        assert_eq!(stats.completion_rate, 33.33);

        let stats = Stats::new(3, 2);
        assert_eq!(stats.completion_rate, 66.67);
    }

    #[test]
    fn stats_serializes_completion_rate_in_camel_case() {
        let json = serde_json::to_value(Stats::new(4, 1)).unwrap();
        assert_eq!(json["completionRate"], 25.0);
        assert_eq!(json["active"], 3);
    }
}
