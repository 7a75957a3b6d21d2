//! Conversation turns, their identifiers, and the data a client sends with
//! every chat request.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn identifiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Who authored a turn. Each kind has its own id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnKind {
    User,
    Ai,
    Error,
}

impl TurnKind {
    pub fn prefix(self) -> &'static str {
        match self {
            TurnKind::User => "user",
            TurnKind::Ai => "ai",
            TurnKind::Error => "error",
        }
    }
}

/// Stable identifier of a turn, rendered as `<prefix>_<seq>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnId {
    kind: TurnKind,
    seq: u64,
}

impl TurnId {
    pub fn kind(&self) -> TurnKind {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.prefix(), self.seq)
    }
}

impl Serialize for TurnId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-session monotonic id source.
///
/// One counter is shared by all kinds, so ids stay unique across prefixes
/// and sort in creation order.
#[derive(Debug, Default)]
pub struct TurnIdGen {
    next: u64,
}

impl TurnIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, kind: TurnKind) -> TurnId {
        let seq = self.next;
        self.next += 1;
        TurnId { kind, seq }
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One message in a conversation, as the client keeps it for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub id: TurnId,
    pub content: String,
    pub is_user: bool,
}

impl Turn {
    pub fn new(id: TurnId, content: impl Into<String>) -> Self {
        Self {
            is_user: id.kind() == TurnKind::User,
            id,
            content: content.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.id.kind() == TurnKind::Error
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire types for the chat endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A prior turn as sent upstream: just the text and who wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub content: String,
    pub is_user: bool,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_user: true }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_user: false }
    }
}

impl From<&Turn> for HistoryEntry {
    fn from(turn: &Turn) -> Self {
        Self {
            content: turn.content.clone(),
            is_user: turn.is_user,
        }
    }
}

/// Travel preferences captured during onboarding. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl UserProfile {
    /// True when no field carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        [&self.name, &self.country, &self.continent, &self.city]
            .iter()
            .all(|f| f.as_deref().map_or(true, |v| v.trim().is_empty()))
    }
}

/// Body of `POST /api/stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatApiRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answers: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversation_history: Vec<HistoryEntry>,
}
