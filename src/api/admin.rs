use std::collections::HashMap;

use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use axum_extra::extract::cookie::CookieJar;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{parse_count, reactions_from_json, Post, PostDraft, EMOJI_PALETTE};
use crate::services::BackendError;
use crate::session::{self, Flash, Session};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_page))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/posts/save", post(save_post))
        .route("/posts/:id/edit", post(edit_post))
        .route("/posts/:id/delete", post(delete_post))
        .route("/draft/reaction/add", post(add_reaction))
        .route("/draft/reaction/remove", post(remove_reaction))
        .route("/draft/reaction/pick", post(pick_emoji))
}

const PREVIEW_SNIPPET_CHARS: usize = 100;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    flash: Option<Flash>,
}

#[derive(Template)]
#[template(path = "admin.html")]
struct AdminTemplate {
    flash: Option<Flash>,
    form: FormView,
    posts: Vec<PostRow>,
    palette: &'static [&'static str],
}

/// Everything the admin form needs to re-render itself, including the
/// in-progress reaction input. The draft round-trips through the form, so
/// this is rebuilt from the submitted fields on every action.
struct FormView {
    editing_id: Option<i64>,
    draft: PostDraft,
    reactions_json: String,
    chips: Vec<ReactionChip>,
    reaction_emoji: String,
    reaction_count: String,
}

struct ReactionChip {
    emoji: String,
    count: u64,
}

impl FormView {
    fn new(
        editing_id: Option<i64>,
        draft: PostDraft,
        reaction_emoji: String,
        reaction_count: String,
    ) -> Self {
        let reactions_json = draft.reactions_json();
        let chips = draft
            .reactions
            .iter()
            .map(|(emoji, count)| ReactionChip {
                emoji: emoji.clone(),
                count: *count,
            })
            .collect();
        Self {
            editing_id,
            draft,
            reactions_json,
            chips,
            reaction_emoji,
            reaction_count,
        }
    }

    fn empty() -> Self {
        Self::new(None, PostDraft::default(), String::new(), String::new())
    }
}

struct PostRow {
    id: i64,
    title: String,
    preview: String,
    image_url: Option<String>,
    views: u64,
    created: String,
}

impl PostRow {
    fn new(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            preview: snippet(&post.preview, PREVIEW_SNIPPET_CHARS),
            image_url: post.image_url.clone(),
            views: post.views,
            created: post.created_at.format("%d.%m.%Y").to_string(),
        }
    }
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

/// The admin form as submitted by the browser. All draft actions post the
/// same multipart form, so one parser serves save and the reaction editor.
struct AdminForm {
    editing_id: Option<i64>,
    draft: PostDraft,
    reaction_emoji: String,
    reaction_count: String,
    remove_emoji: String,
    pick_emoji: String,
    image: Option<UploadedImage>,
}

struct UploadedImage {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn read_admin_form(mut multipart: Multipart) -> Result<AdminForm> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image_file" {
            let filename = field.file_name().unwrap_or("image.jpg").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            // Browsers submit an empty part when no file was chosen.
            if !bytes.is_empty() {
                image = Some(UploadedImage {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields.insert(name, value);
        }
    }

    let mut take = |key: &str| fields.remove(key).unwrap_or_default();
    let draft = PostDraft {
        title: take("title"),
        preview: take("preview"),
        image_url: take("image_url"),
        post_url: take("post_url"),
        views: parse_count(&take("views")),
        reactions: reactions_from_json(&take("reactions_json")),
    };

    Ok(AdminForm {
        editing_id: fields.get("id").and_then(|v| v.parse().ok()),
        draft,
        reaction_emoji: fields.remove("reaction_emoji").unwrap_or_default(),
        reaction_count: fields.remove("reaction_count").unwrap_or_default(),
        remove_emoji: fields.remove("remove_emoji").unwrap_or_default(),
        pick_emoji: fields.remove("pick_emoji").unwrap_or_default(),
        image,
    })
}

fn session_of(state: &AppState, jar: &CookieJar) -> Session {
    Session::from_jar(jar, &state.config.session.cookie)
}

/// Clear the session and bounce to the login view. The draft is dropped
/// with the form; the operator logs back in and starts over.
fn invalidate_session(state: &AppState, jar: CookieJar) -> Response {
    let jar = session::clear_token(jar, &state.config.session.cookie);
    let jar = session::set_flash(jar, &Flash::error("Session expired, please log in again"));
    (jar, Redirect::to("/admin")).into_response()
}

fn redirect_with_flash(jar: CookieJar, flash: Flash) -> Response {
    let jar = session::set_flash(jar, &flash);
    (jar, Redirect::to("/admin")).into_response()
}

/// Render the admin dashboard: the (possibly pre-filled) form above the
/// full post list. The list is re-fetched on every render; a failed fetch
/// degrades to an empty list with an error notice.
async fn render_admin(state: &AppState, flash: Option<Flash>, form: FormView) -> AdminTemplate {
    let (posts, flash) = match state.backend.list_posts().await {
        Ok(posts) => (posts, flash),
        Err(e) => {
            tracing::warn!("failed to load posts for the admin list: {e}");
            (
                Vec::new(),
                flash.or_else(|| Some(Flash::error("Failed to load posts"))),
            )
        }
    };

    AdminTemplate {
        flash,
        form,
        posts: posts.iter().map(PostRow::new).collect(),
        palette: &EMOJI_PALETTE,
    }
}

async fn admin_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, flash) = session::take_flash(jar);

    if !session_of(&state, &jar).is_authenticated() {
        return (jar, LoginTemplate { flash }).into_response();
    }

    let page = render_admin(&state, flash, FormView::empty()).await;
    (jar, page).into_response()
}

#[derive(Debug, Deserialize, Validate)]
struct LoginForm {
    #[validate(length(min = 1))]
    username: String,
    #[validate(length(min = 1))]
    password: String,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if form.validate().is_err() {
        return redirect_with_flash(jar, Flash::error("Username and password are required"));
    }

    match state.backend.login(&form.username, &form.password).await {
        Ok(token) => {
            let jar = session::store_token(jar, &state.config.session.cookie, &token);
            redirect_with_flash(jar, Flash::success("Logged in"))
        }
        Err(BackendError::Unauthorized) => {
            redirect_with_flash(jar, Flash::error("Invalid username or password"))
        }
        Err(e) => {
            tracing::warn!("login failed: {e}");
            redirect_with_flash(jar, Flash::error("Failed to log in"))
        }
    }
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let jar = session::clear_token(jar, &state.config.session.cookie);
    redirect_with_flash(jar, Flash::success("Logged out"))
}

async fn save_post(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response> {
    let Some(token) = session_of(&state, &jar).token().map(String::from) else {
        return Ok(redirect_with_flash(jar, Flash::error("Please log in")));
    };

    let form = read_admin_form(multipart).await?;
    let mut draft = form.draft;

    if let Err(reason) = draft.validate() {
        let view = FormView::new(
            form.editing_id,
            draft,
            form.reaction_emoji,
            form.reaction_count,
        );
        let page = render_admin(&state, Some(Flash::error(reason)), view).await;
        return Ok((jar, page).into_response());
    }

    if let Some(image) = &form.image {
        draft.image_url = resolve_image_url(&state, image).await;
    }

    let saved = match form.editing_id {
        Some(id) => state.backend.update_post(id, &draft, &token).await,
        None => state.backend.create_post(&draft, &token).await,
    };

    match saved {
        Ok(_) => {
            let message = if form.editing_id.is_some() {
                "Post updated"
            } else {
                "Post created"
            };
            Ok(redirect_with_flash(jar, Flash::success(message)))
        }
        Err(BackendError::Unauthorized) => Ok(invalidate_session(&state, jar)),
        Err(e) => {
            tracing::warn!("failed to save post: {e}");
            let view = FormView::new(
                form.editing_id,
                draft,
                form.reaction_emoji,
                form.reaction_count,
            );
            let page = render_admin(&state, Some(Flash::error("Failed to save post")), view).await;
            Ok((jar, page).into_response())
        }
    }
}

/// Prefer the CDN URL returned by the ingest endpoint; fall back to the
/// inline base64 payload only when the upload fails.
async fn resolve_image_url(state: &AppState, image: &UploadedImage) -> String {
    let encoded = STANDARD.encode(&image.bytes);
    match state.backend.upload_image(&encoded, &image.filename).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("image upload failed, storing inline payload: {e}");
            format!("data:{};base64,{encoded}", image.content_type)
        }
    }
}

async fn edit_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    if !session_of(&state, &jar).is_authenticated() {
        return redirect_with_flash(jar, Flash::error("Please log in"));
    }

    match state.backend.get_post(id).await {
        Ok(post) => {
            let view = FormView::new(
                Some(post.id),
                PostDraft::from_post(&post),
                String::new(),
                String::new(),
            );
            let page = render_admin(&state, None, view).await;
            (jar, page).into_response()
        }
        Err(e) => {
            tracing::warn!("failed to load post {id} for editing: {e}");
            redirect_with_flash(jar, Flash::error("Failed to load post"))
        }
    }
}

async fn delete_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Response {
    let Some(token) = session_of(&state, &jar).token().map(String::from) else {
        return redirect_with_flash(jar, Flash::error("Please log in"));
    };

    match state.backend.delete_post(id, &token).await {
        Ok(()) => redirect_with_flash(jar, Flash::success("Post deleted")),
        Err(BackendError::Unauthorized) => invalidate_session(&state, jar),
        Err(e) => {
            tracing::warn!("failed to delete post {id}: {e}");
            redirect_with_flash(jar, Flash::error("Failed to delete post"))
        }
    }
}

async fn add_reaction(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response> {
    if !session_of(&state, &jar).is_authenticated() {
        return Ok(redirect_with_flash(jar, Flash::error("Please log in")));
    }

    let form = read_admin_form(multipart).await?;
    let mut draft = form.draft;
    draft.add_reaction(&form.reaction_emoji, &form.reaction_count);

    // The inputs reset after a successful add, as they do on a no-op.
    let view = FormView::new(form.editing_id, draft, String::new(), String::new());
    let page = render_admin(&state, None, view).await;
    Ok((jar, page).into_response())
}

async fn remove_reaction(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response> {
    if !session_of(&state, &jar).is_authenticated() {
        return Ok(redirect_with_flash(jar, Flash::error("Please log in")));
    }

    let form = read_admin_form(multipart).await?;
    let mut draft = form.draft;
    draft.remove_reaction(&form.remove_emoji);

    let view = FormView::new(
        form.editing_id,
        draft,
        form.reaction_emoji,
        form.reaction_count,
    );
    let page = render_admin(&state, None, view).await;
    Ok((jar, page).into_response())
}

/// Palette shortcut: put the chosen emoji into the reaction label input.
async fn pick_emoji(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response> {
    if !session_of(&state, &jar).is_authenticated() {
        return Ok(redirect_with_flash(jar, Flash::error("Please log in")));
    }

    let form = read_admin_form(multipart).await?;
    let view = FormView::new(
        form.editing_id,
        form.draft,
        form.pick_emoji,
        form.reaction_count,
    );
    let page = render_admin(&state, None, view).await;
    Ok((jar, page).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_char_safe() {
        let text = "Разбор кейса: как маркетинг увеличил конверсию";
        let cut = snippet(text, 10);
        assert_eq!(cut, "Разбор кей...");

        let short = snippet("short", 10);
        assert_eq!(short, "short");
    }
}
