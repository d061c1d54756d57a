//! Per-project chat log, kept in memory for the lifetime of the session.
//! Messages are never persisted or sent to other clients.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::events::StoreEvent;
use super::models::{ChatMessage, ProjectId};

#[derive(Debug, Default)]
pub struct ChatLog {
    messages: HashMap<ProjectId, Vec<ChatMessage>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. Blank or whitespace-only text is ignored and
    /// `None` is returned.
    pub fn add_chat_message(
        &mut self,
        project_id: &str,
        message: &str,
        sender: &str,
    ) -> Option<ChatMessage> {
        if message.trim().is_empty() {
            tracing::debug!(project_id, "ignoring blank chat message");
            return None;
        }
        let entry = ChatMessage {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            message: message.to_string(),
            sender: sender.to_string(),
            timestamp: Utc::now(),
        };
        self.messages
            .entry(project_id.to_string())
            .or_default()
            .push(entry.clone());
        Some(entry)
    }

    /// Messages for `project_id` in insertion order.
    pub fn get_project_chat_messages(&self, project_id: &str) -> Vec<ChatMessage> {
        self.messages.get(project_id).cloned().unwrap_or_default()
    }

    pub fn message_count(&self, project_id: &str) -> usize {
        self.messages.get(project_id).map_or(0, Vec::len)
    }

    pub fn clear_project(&mut self, project_id: &str) {
        self.messages.remove(project_id);
    }

    /// Follow the project store: a deleted project takes its log with it.
    /// Feed this every event from [`ProjectStore::subscribe`].
    ///
    /// [`ProjectStore::subscribe`]: super::store::ProjectStore::subscribe
    pub fn apply_event(&mut self, event: &StoreEvent) {
        if let StoreEvent::ProjectDeleted { project_id } = event {
            if self.messages.contains_key(project_id) {
                tracing::debug!(project_id = %project_id, "dropping chat log of deleted project");
            }
            self.clear_project(project_id);
        }
    }
}
