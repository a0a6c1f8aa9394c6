use std::collections::BTreeMap;

use serde::Serialize;

use super::Post;

/// Shortcut palette offered next to the emoji input in the admin form.
pub const EMOJI_PALETTE: [&str; 12] = [
    "🔥", "❤️", "👍", "😂", "😍", "🎉", "💯", "👏", "⭐", "✨", "💪", "🚀",
];

/// Upper bound on the emoji label input.
pub const MAX_EMOJI_CHARS: usize = 8;

/// The editable subset of a post, as carried by the admin form.
///
/// The draft is stateless on the server: every admin action posts the whole
/// form back and the draft is re-parsed from it, so all form semantics (the
/// lenient `views` coercion, the reaction editor rules) live here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub preview: String,
    pub image_url: String,
    pub post_url: String,
    pub views: u64,
    pub reactions: BTreeMap<String, u64>,
}

impl PostDraft {
    /// Pre-fill the form from an existing post for editing.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            preview: post.preview.clone(),
            image_url: post.image_url.clone().unwrap_or_default(),
            post_url: post.post_url.clone().unwrap_or_default(),
            views: post.views,
            reactions: post.reactions.clone(),
        }
    }

    /// Title and preview are required; nothing is sent to the backend until
    /// both are present.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("Title is required");
        }
        if self.preview.trim().is_empty() {
            return Err("Preview text is required");
        }
        Ok(())
    }

    /// Insert or overwrite a reaction. An empty emoji or an empty count
    /// input is a no-op; a non-numeric count coerces to 0.
    pub fn add_reaction(&mut self, emoji: &str, count: &str) {
        let emoji = emoji.trim();
        let count = count.trim();
        if emoji.is_empty() || count.is_empty() {
            return;
        }
        let label: String = emoji.chars().take(MAX_EMOJI_CHARS).collect();
        self.reactions.insert(label, parse_count(count));
    }

    /// Removing a key that does not exist is a no-op.
    pub fn remove_reaction(&mut self, emoji: &str) {
        self.reactions.remove(emoji);
    }

    /// The reaction mapping as it round-trips through the hidden form field.
    pub fn reactions_json(&self) -> String {
        serde_json::to_string(&self.reactions).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Non-numeric or negative input coerces to 0, never an error.
pub fn parse_count(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

/// A corrupt hidden field resets the mapping rather than failing the action.
pub fn reactions_from_json(raw: &str) -> BTreeMap<String, u64> {
    serde_json::from_str(raw).unwrap_or_default()
}
