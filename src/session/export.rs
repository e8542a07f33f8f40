// Transcript export: plain text for people, JSON for tooling
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::Result;
use crate::session::conversation::{ChatSession, ConversationTurn};

/// Serializable snapshot of a session's conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub exported_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
    pub contexts: Vec<Vec<String>>,
    pub uploaded: Vec<String>,
}

impl SessionRecord {
    pub fn from_session(session: &ChatSession) -> Self {
        Self {
            id: session.id(),
            started_at: session.started_at(),
            exported_at: Utc::now(),
            turns: session.turns().to_vec(),
            contexts: session.contexts().to_vec(),
            uploaded: session.uploaded_documents().to_vec(),
        }
    }
}

/// Write the session transcript to `path`
///
/// Files ending in `.json` get a [`SessionRecord`]; anything else gets the
/// plain `You:` / `Bot:` transcript. Parent directories are created.
pub fn export_session(session: &ChatSession, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let body = if is_json {
        serde_json::to_string_pretty(&SessionRecord::from_session(session))?
    } else {
        let mut text = session.export_transcript();
        text.push('\n');
        text
    };

    fs::write(path, body)?;
    tracing::info!(session = %session.id(), path = %path.display(), "transcript exported");
    Ok(path.to_path_buf())
}
