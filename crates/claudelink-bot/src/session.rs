//! In-memory session state.
//!
//! One record for the whole process: the resumable session id reported by
//! the CLI plus a running message count. Held behind a mutex by the
//! dispatcher state; never persisted, so a restart always starts fresh.

/// Current conversation state with the CLI.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session_id: Option<String>,
    message_count: u32,
}

impl SessionState {
    /// Session id to resume, if one is active.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub const fn message_count(&self) -> u32 {
        self.message_count
    }

    /// Record a finished exchange: adopt the reported session id (keeping
    /// the previous one when the CLI reported none) and bump the count.
    pub fn record_exchange(&mut self, session_id: Option<String>) {
        if session_id.is_some() {
            self.session_id = session_id;
        }
        self.message_count += 1;
    }

    /// Drop back to the idle state; the next message starts a new session.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Short display form of the session id for `/status`.
    pub fn short_id(&self) -> String {
        self.session_id.as_deref().map_or_else(
            || "none".to_string(),
            |id| {
                let prefix: String = id.chars().take(8).collect();
                format!("{prefix}...")
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_idle() {
        let state = SessionState::default();
        assert_eq!(state.session_id(), None);
        assert_eq!(state.message_count(), 0);
        assert_eq!(state.short_id(), "none");
    }

    #[test]
    fn record_exchange_adopts_id_and_counts() {
        let mut state = SessionState::default();
        state.record_exchange(Some("sess-1234abcd-rest".into()));
        assert_eq!(state.session_id(), Some("sess-1234abcd-rest"));
        assert_eq!(state.message_count(), 1);
        assert_eq!(state.short_id(), "sess-123...");
    }

    #[test]
    fn missing_id_keeps_previous_session() {
        let mut state = SessionState::default();
        state.record_exchange(Some("first".into()));
        state.record_exchange(None);
        assert_eq!(state.session_id(), Some("first"));
        assert_eq!(state.message_count(), 2);
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = SessionState::default();
        state.record_exchange(Some("first".into()));
        state.clear();
        assert_eq!(state.session_id(), None);
        assert_eq!(state.message_count(), 0);
    }
}
