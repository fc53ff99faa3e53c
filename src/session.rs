use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::docs::types::PdfDocument;
use crate::docs::DocumentStore;
use crate::qa::ScoredAnswer;
use crate::router::ModelSelection;
use crate::state::PipelineConfig;

pub type SessionId = String;

/// Turns of conversation replayed into the next prompt.
pub const MEMORY_TURNS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// One answered question as kept in session history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub question: String,
    pub topic: &'static str,
    pub answers: Vec<ScoredAnswer>,
    pub improved: Option<ScoredAnswer>,
    pub selection: Option<ModelSelection>,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// The answer shown as final: the improved one if any, else the best scored.
    pub fn final_answer(&self) -> Option<&ScoredAnswer> {
        self.improved.as_ref().or_else(|| {
            self.answers
                .iter()
                .max_by(|a, b| a.quality.score.total_cmp(&b.quality.score))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_questions: usize,
    pub average_quality: f64,
    pub improved_count: usize,
}

/// Everything one browser session owns. Dropped or reset as a unit.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub config: PipelineConfig,
    pub documents: DocumentStore,
    pub history: Vec<HistoryEntry>,
    pub conversation: Vec<ConversationTurn>,
    /// Bumped by every reset; uploads started before a reset are discarded.
    generation: u64,
}

impl Session {
    pub fn new(id: SessionId, config: PipelineConfig) -> Self {
        Self {
            id,
            config,
            documents: DocumentStore::default(),
            history: Vec::new(),
            conversation: Vec::new(),
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store a document ingested while the session was at `generation`.
    /// Returns `None` if the session has been reset since.
    pub fn admit_document(&mut self, generation: u64, doc: PdfDocument) -> Option<&PdfDocument> {
        if generation != self.generation {
            debug!(session = %self.id, doc_id = %doc.id, "dropping upload from before reset");
            return None;
        }
        Some(self.documents.add(doc))
    }

    /// Forget documents, history and conversation; keep the configuration.
    pub fn reset(&mut self) {
        self.documents.clear();
        self.history.clear();
        self.conversation.clear();
        self.generation += 1;
        info!(session = %self.id, "session reset");
    }

    /// Last `limit` entries, newest first.
    pub fn recent_history(&self, limit: usize) -> Vec<&HistoryEntry> {
        self.history.iter().rev().take(limit).collect()
    }

    pub fn stats(&self) -> HistoryStats {
        let total_questions = self.history.len();
        let scores: Vec<f64> = self
            .history
            .iter()
            .filter_map(|e| e.final_answer().map(|a| a.quality.score))
            .collect();
        let average_quality = if scores.is_empty() {
            0.0
        } else {
            let avg = scores.iter().sum::<f64>() / scores.len() as f64;
            (avg * 10.0).round() / 10.0
        };

        HistoryStats {
            total_questions,
            average_quality,
            improved_count: self.history.iter().filter(|e| e.improved.is_some()).count(),
        }
    }

    /// The last [`MEMORY_TURNS`] turns rendered as `사용자: …` / `AI: …` lines.
    pub fn conversation_context(&self) -> String {
        let start = self.conversation.len().saturating_sub(MEMORY_TURNS);
        self.conversation[start..]
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    Role::User => "사용자",
                    Role::Assistant => "AI",
                };
                format!("{}: {}", speaker, turn.message)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn remember(&mut self, role: Role, message: impl Into<String>) {
        self.conversation.push(ConversationTurn {
            role,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }
}

#[derive(Debug)]
struct Slot {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

/// All live sessions, keyed by a random id handed to the browser.
///
/// A session nobody has touched for the configured TTL is dropped by the
/// reaper task.
#[derive(Debug, Default, Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionId, Slot>>>,
}

impl SessionManager {
    pub async fn create(&self, config: PipelineConfig) -> SessionId {
        let id = Uuid::new_v4().to_string();
        let slot = Slot {
            session: Arc::new(Mutex::new(Session::new(id.clone(), config))),
            last_seen: Instant::now(),
        };
        self.sessions.write().await.insert(id.clone(), slot);
        info!(session = %id, "session created");
        id
    }

    /// Look up a session and mark it as recently used.
    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(id)?;
        slot.last_seen = Instant::now();
        Some(slot.session.clone())
    }

    /// Whether `id` is still live, without refreshing it.
    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session = %id, "session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every session idle for longer than `ttl`. Returns how many went.
    pub async fn reap_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| now.duration_since(slot.last_seen) <= ttl);
        let reaped = before - sessions.len();
        if reaped > 0 {
            info!(reaped, live = sessions.len(), "idle sessions reclaimed");
        }
        reaped
    }

    /// Run [`reap_idle`](Self::reap_idle) periodically, every half TTL.
    pub fn spawn_reaper(&self, ttl: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        let period = (ttl / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                manager.reap_idle(ttl).await;
            }
        })
    }
}
