use askama::Template;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::CookieJar;

use crate::models::Post;
use crate::session::{take_flash, Flash};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Tile shown in place of a thumbnail for posts without an image.
const PLACEHOLDER_EMOJI: &str = "📊";

/// How many reactions a card shows before the rest are elided.
const REACTIONS_PER_CARD: usize = 3;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    channel: ChannelView,
    posts: Vec<PostCard>,
    flash: Option<Flash>,
}

struct ChannelView {
    name: String,
    handle: String,
    tagline: String,
    subscribers: u64,
    avatar_url: String,
    telegram_url: String,
}

struct PostCard {
    href: String,
    image_url: Option<String>,
    placeholder: &'static str,
    title: Option<String>,
    preview: String,
    reactions: Vec<ReactionView>,
    views: u64,
}

struct ReactionView {
    emoji: String,
    count: u64,
}

impl PostCard {
    fn new(post: &Post, channel_url: &str) -> Self {
        Self {
            href: post
                .post_url
                .clone()
                .unwrap_or_else(|| channel_url.to_string()),
            image_url: post.image_url.clone(),
            placeholder: PLACEHOLDER_EMOJI,
            title: (!post.title.trim().is_empty()).then(|| post.title.clone()),
            preview: post.preview.clone(),
            reactions: post
                .reactions
                .iter()
                .take(REACTIONS_PER_CARD)
                .map(|(emoji, count)| ReactionView {
                    emoji: emoji.clone(),
                    count: *count,
                })
                .collect(),
            views: post.views,
        }
    }
}

/// Public showcase page. One unauthenticated fetch per page load; a failed
/// fetch renders an empty list with an error notice and is not retried.
async fn index(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, mut flash) = take_flash(jar);

    let posts = match state.backend.list_posts().await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::warn!("failed to load posts for the showcase: {e}");
            flash = Some(Flash::error("Failed to load posts"));
            Vec::new()
        }
    };

    let channel = &state.config.channel;
    let telegram_url = channel.telegram_url();
    let cards = posts
        .iter()
        .take(state.config.showcase.top_posts)
        .map(|post| PostCard::new(post, &telegram_url))
        .collect();

    let page = IndexTemplate {
        channel: ChannelView {
            name: channel.name.clone(),
            handle: channel.handle.clone(),
            tagline: channel.tagline.clone(),
            subscribers: channel.subscribers,
            avatar_url: channel.avatar_url.clone(),
            telegram_url,
        },
        posts: cards,
        flash,
    };

    (jar, page)
}
