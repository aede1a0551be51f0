//! JSON persistence for the to-do list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::list::{TodoItem, TodoLog};

/// On-disk document: items and the mutation log in one file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(default)]
    pub todos: Vec<TodoItem>,
    #[serde(default)]
    pub logs: Vec<TodoLog>,
}

pub fn default_store_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/focus_clock/todos.json")
}

fn parse_document(content: &str) -> Option<TodoDocument> {
    match serde_json::from_str(content) {
        Ok(doc) => Some(doc),
        Err(e) => {
            eprintln!("Warning: to-do file is malformed, starting empty: {}", e);
            None
        }
    }
}

/// Load the document; a missing or unreadable file yields an empty one.
pub fn load(path: &Path) -> TodoDocument {
    if !path.exists() {
        return TodoDocument::default();
    }
    match fs::read_to_string(path) {
        Ok(content) => parse_document(&content).unwrap_or_default(),
        Err(e) => {
            eprintln!(
                "Warning: could not read {}, starting empty: {}",
                path.display(),
                e
            );
            TodoDocument::default()
        }
    }
}

pub fn save(path: &Path, doc: &TodoDocument) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(doc)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip() {
        let doc = TodoDocument {
            todos: vec![TodoItem {
                id: 1756500000000,
                name: "water plants".to_string(),
                completed: false,
                date: "2026-08-30".to_string(),
            }],
            logs: vec![TodoLog {
                timestamp: "2026-08-30 09:00:00".to_string(),
                action: super::super::list::TodoAction::Add,
                name: "water plants".to_string(),
            }],
        };
        let json = serde_json::to_string_pretty(&doc).unwrap();
        let back: TodoDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.todos, doc.todos);
        assert_eq!(back.logs, doc.logs);
    }

    #[test]
    fn test_malformed_content_falls_back_to_empty() {
        assert!(parse_document("{not json").is_none());
        let doc: TodoDocument = parse_document("{}").unwrap();
        assert!(doc.todos.is_empty());
        assert!(doc.logs.is_empty());
    }
}
