mod draft;
mod post;

pub use draft::{parse_count, reactions_from_json, PostDraft, EMOJI_PALETTE, MAX_EMOJI_CHARS};
pub use post::Post;
