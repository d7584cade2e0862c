//! Conversation state.
//!
//! Holds the locally observable view of a conversation and the per-conversation
//! send state machine. A conversation is either `Idle` or `Pending`; while
//! pending, its last unanswered turn is waiting for a reply and no other send
//! is accepted.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Send state of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SendState {
    /// No reply is outstanding; a new message may be sent.
    #[default]
    Idle,
    /// A reply has been requested and not yet received or failed.
    Pending,
}

impl SendState {
    pub fn is_pending(self) -> bool {
        self == SendState::Pending
    }
}

/// One user utterance and its bot reply.
///
/// The bot text is empty while the reply is pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    /// What the user said. Never changes once the turn exists.
    pub user: String,
    /// The reply, or an error placeholder if the request failed.
    pub bot: String,
}

impl Turn {
    /// A turn whose reply has not arrived yet.
    pub fn pending(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: String::new(),
        }
    }

    /// A turn with a reply.
    pub fn answered(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.bot.is_empty()
    }
}

/// Local view of a remote conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server-assigned identifier.
    pub id: String,
    /// System instruction prepended to every prompt.
    #[serde(default)]
    pub pre_prompt: String,
    /// Turns in chronological order.
    #[serde(default)]
    pub turns: Vec<Turn>,
    /// Whether a reply is outstanding.
    #[serde(default)]
    pub send_state: SendState,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pre_prompt: String::new(),
            turns: Vec::new(),
            send_state: SendState::Idle,
        }
    }

    pub fn with_pre_prompt(mut self, pre_prompt: impl Into<String>) -> Self {
        self.pre_prompt = pre_prompt.into();
        self
    }

    /// Move from `Idle` to `Pending` and append an unanswered turn.
    ///
    /// Fails without touching state if a reply is already pending.
    pub fn begin_send(&mut self, prompt: &str) -> Result<()> {
        if self.send_state.is_pending() {
            return Err(ClientError::SendInFlight(self.id.clone()));
        }
        self.turns.push(Turn::pending(prompt));
        self.send_state = SendState::Pending;
        Ok(())
    }

    /// Fill the pending turn for `prompt` with `bot` and return to `Idle`.
    ///
    /// The pending turn is the last turn with the same user text and no reply.
    /// Returns false if no such turn exists any more (e.g. the turns were
    /// cleared while the request was in flight).
    pub fn complete_send(&mut self, prompt: &str, bot: impl Into<String>) -> bool {
        self.send_state = SendState::Idle;
        match self
            .turns
            .iter_mut()
            .rev()
            .find(|turn| turn.user == prompt && turn.is_pending())
        {
            Some(turn) => {
                turn.bot = bot.into();
                true
            }
            None => false,
        }
    }

    /// Replace the turns with server-confirmed ones.
    ///
    /// While a send is pending its unanswered turn is kept at the end so the
    /// reply still has somewhere to land.
    pub fn replace_turns(&mut self, turns: Vec<Turn>) {
        let pending = if self.send_state.is_pending() {
            self.turns.iter().rev().find(|t| t.is_pending()).cloned()
        } else {
            None
        };

        self.turns = turns;
        if let Some(turn) = pending {
            self.turns.push(turn);
        }
    }

    /// Drop all turns, keeping a pending one if a reply is outstanding.
    pub fn clear_turns(&mut self) {
        self.replace_turns(Vec::new());
    }

    /// The turn waiting for a reply, if any.
    pub fn pending_turn(&self) -> Option<&Turn> {
        if self.send_state.is_pending() {
            self.turns.iter().rev().find(|t| t.is_pending())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_begin_send_appends_pending_turn() {
        let mut conv = Conversation::new("abc");
        conv.begin_send("Hi").unwrap();

        assert_eq!(conv.send_state, SendState::Pending);
        assert_eq!(conv.turns, vec![Turn::pending("Hi")]);
        assert_eq!(conv.pending_turn(), Some(&Turn::pending("Hi")));
    }

    #[test]
    fn test_second_send_rejected_without_mutation() {
        let mut conv = Conversation::new("abc");
        conv.begin_send("Hi").unwrap();
        let before = conv.clone();

        let err = conv.begin_send("Again").unwrap_err();
        assert_eq!(err, ClientError::SendInFlight("abc".to_string()));
        assert_eq!(conv, before);
    }

    #[test]
    fn test_complete_send_fills_reply_and_returns_to_idle() {
        let mut conv = Conversation::new("abc");
        conv.begin_send("Hi").unwrap();

        assert!(conv.complete_send("Hi", "Hello."));
        assert_eq!(conv.send_state, SendState::Idle);
        assert_eq!(conv.turns, vec![Turn::answered("Hi", "Hello.")]);
        assert!(conv.pending_turn().is_none());
    }

    #[test]
    fn test_complete_send_targets_last_matching_turn() {
        let mut conv = Conversation::new("abc");
        conv.turns.push(Turn::answered("Hi", "Hello."));
        conv.begin_send("Hi").unwrap();

        assert!(conv.complete_send("Hi", "Hello again."));
        assert_eq!(
            conv.turns,
            vec![
                Turn::answered("Hi", "Hello."),
                Turn::answered("Hi", "Hello again.")
            ]
        );
    }

    #[test]
    fn test_complete_send_after_clear_still_goes_idle() {
        let mut conv = Conversation::new("abc");
        conv.begin_send("Hi").unwrap();
        conv.turns.clear();

        assert!(!conv.complete_send("Hi", "Hello."));
        assert_eq!(conv.send_state, SendState::Idle);
    }

    #[test]
    fn test_replace_turns_keeps_pending_turn() {
        let mut conv = Conversation::new("abc");
        conv.begin_send("Hi").unwrap();

        conv.replace_turns(vec![Turn::answered("Earlier", "Reply")]);
        assert_eq!(
            conv.turns,
            vec![Turn::answered("Earlier", "Reply"), Turn::pending("Hi")]
        );

        conv.clear_turns();
        assert_eq!(conv.turns, vec![Turn::pending("Hi")]);
    }

    #[test]
    fn test_replace_turns_when_idle() {
        let mut conv = Conversation::new("abc");
        conv.turns.push(Turn::answered("Old", "Stale"));

        conv.replace_turns(vec![Turn::answered("New", "Fresh")]);
        assert_eq!(conv.turns, vec![Turn::answered("New", "Fresh")]);
    }

    #[test]
    fn test_send_state_serialization() {
        assert_eq!(
            serde_json::to_string(&SendState::Pending).unwrap(),
            "\"pending\""
        );
    }
}
