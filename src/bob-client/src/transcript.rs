//! Transcript text rules.
//!
//! The backend stores conversations as flat user/bot text pairs. The first
//! pair of every conversation is a synthetic record carrying the pre-prompt,
//! and stored text may still carry the role labels the prompt was built with.
//! These helpers turn that raw form into clean [`Turn`]s and build the prompt
//! sent for a new message.

use crate::models::MessagePair;
use crate::state::Turn;

/// Prefix of the bot text of the synthetic pre-prompt record.
pub const PRE_PROMPT_MARKER: &str = "Pré-prompt:";

/// Role label preceding user text in a prompt transcript.
pub const USER_LABEL: &str = "User: ";

/// Role label preceding the bot reply in a prompt transcript.
pub const BOT_LABEL: &str = "Bot:";

/// Whether `pair` is the synthetic record that stores the pre-prompt.
pub fn is_pre_prompt_record(pair: &MessagePair) -> bool {
    pair.user.is_empty() && pair.bot.starts_with(PRE_PROMPT_MARKER)
}

/// Strip surrounding whitespace and role labels from user text.
///
/// Removes any leading `"User: "` / `"Bot:"` labels and a trailing `"Bot:"`
/// label left over from the prompt line.
pub fn strip_role_labels(text: &str) -> String {
    let mut text = text.trim();

    loop {
        if let Some(rest) = text.strip_prefix(USER_LABEL.trim_end()) {
            text = rest.trim_start();
        } else if let Some(rest) = text.strip_prefix(BOT_LABEL) {
            text = rest.trim_start();
        } else {
            break;
        }
    }

    if let Some(rest) = text.strip_suffix(BOT_LABEL) {
        text = rest;
    }

    text.trim().to_string()
}

/// Strip surrounding whitespace and a leading `"Bot:"` label from bot text.
pub fn strip_bot_label(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix(BOT_LABEL).unwrap_or(text).trim().to_string()
}

/// Convert raw message pairs into turns, dropping the pre-prompt record.
///
/// A stored reply that is empty once labels are stripped is replaced by
/// `placeholder`, so fetched turns are never mistaken for pending ones.
pub fn normalize_messages(messages: Vec<MessagePair>, placeholder: &str) -> Vec<Turn> {
    messages
        .into_iter()
        .filter(|pair| !is_pre_prompt_record(pair))
        .map(|pair| {
            let bot = strip_bot_label(&pair.bot);
            let bot = if bot.is_empty() {
                placeholder.to_string()
            } else {
                bot
            };
            Turn::answered(strip_role_labels(&pair.user), bot)
        })
        .collect()
}

/// Build the prompt sent to `/generate` for a new user message.
pub fn format_prompt(pre_prompt: &str, prompt: &str) -> String {
    format!("{pre_prompt}\n{USER_LABEL}{prompt}\n{BOT_LABEL}")
}
