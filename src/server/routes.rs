//! Request handlers for the HTTP API.

use std::fmt::Write as _;
use std::path::Path;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::Error;
use crate::paths::is_video_file;
use crate::server::error::AppError;
use crate::server::{streaming, AppContext};

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubtitleQuery {
    path: Option<String>,
    lang: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Validation(format!("missing required parameter: {name}")).into())
}

/// 302 redirect. `axum::response::Redirect` only offers 303/307/308, and
/// the frontend expects the classic found status.
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// `GET /` lands on the frontend.
pub async fn index() -> Response {
    found("/static/")
}

/// `GET /api/browse?path=` returns a JSON directory listing.
pub async fn browse_json(
    State(ctx): State<AppContext>,
    Query(query): Query<BrowseQuery>,
) -> Result<Response, AppError> {
    let path = query.path.as_deref().unwrap_or("/");
    let items = ctx.lister.list(path).await?;
    Ok(Json(json!({ "path": path, "items": items })).into_response())
}

/// `GET /api/browse/html?path=` returns the listing as an HTML fragment
/// for the htmx-driven frontend.
pub async fn browse_html(
    State(ctx): State<AppContext>,
    Query(query): Query<BrowseQuery>,
) -> Result<Response, AppError> {
    let path = match query.path.as_deref() {
        Some(p) if !p.is_empty() => p,
        _ => "/",
    };

    // A path with an extension names a file, which can never be listed.
    if Path::new(path).extension().is_some() {
        return Err(Error::Validation("cannot list a file".into()).into());
    }

    let items = ctx.lister.list(path).await?;
    Ok(Html(render_listing(path, &items)).into_response())
}

/// `GET /api/video?path=` returns probed metadata for one file.
pub async fn video_info(
    State(ctx): State<AppContext>,
    Query(query): Query<VideoQuery>,
) -> Result<Response, AppError> {
    let path = required(&query.path, "path")?;
    let full = ctx.guard.resolve(path)?;
    let info = ctx.metadata.get(&full).await?;
    Ok(Json(json!({ "path": path, "type": "video", "info": info })).into_response())
}

/// `GET|HEAD /api/video/stream?path=` streams file bytes, honoring a
/// single-range `Range` header.
pub async fn video_stream(
    State(ctx): State<AppContext>,
    Query(query): Query<VideoQuery>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let path = required(&query.path, "path")?;
    let full = ctx.guard.resolve(path)?;

    if !is_video_file(&full) {
        return Err(Error::Validation(format!("not a video file: {path}")).into());
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    Ok(streaming::serve_file(&full, range, &method).await?)
}

/// `GET /api/video/thumbnail?path=` redirects to the cached thumbnail,
/// generating it on first request, or to the placeholder on failure.
pub async fn video_thumbnail(
    State(ctx): State<AppContext>,
    Query(query): Query<VideoQuery>,
) -> Result<Response, AppError> {
    let path = required(&query.path, "path")?;
    let full = ctx.guard.resolve(path)?;

    let location = match ctx.artifacts.ensure_thumbnail(&full).await {
        Some(artifact) => artifact_url("/thumbnails", &artifact)?,
        None => crate::artifacts::PLACEHOLDER_THUMBNAIL.to_string(),
    };
    Ok(found(&location))
}

/// `GET /api/video/subtitle?path=&lang=` redirects to the extracted WebVTT
/// file; 404 when the video has no track in that language.
pub async fn video_subtitle(
    State(ctx): State<AppContext>,
    Query(query): Query<SubtitleQuery>,
) -> Result<Response, AppError> {
    let path = required(&query.path, "path")?;
    let lang = required(&query.lang, "lang")?;
    let full = ctx.guard.resolve(path)?;

    let artifact = ctx
        .artifacts
        .ensure_subtitle(&full, lang, &ctx.metadata)
        .await?;
    Ok(found(&artifact_url("/subtitles", &artifact)?))
}

fn artifact_url(mount: &str, artifact: &Path) -> Result<String, AppError> {
    let file = artifact
        .file_name()
        .ok_or_else(|| Error::Internal("artifact path has no file name".into()))?;
    Ok(format!("{mount}/{}", file.to_string_lossy()))
}

// ---------------------------------------------------------------------------
// HTML rendering
// ---------------------------------------------------------------------------

/// Strip the extension and turn `_`/`-` into spaces for display.
fn format_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    stem.replace(['_', '-'], " ")
}

/// `MM:SS`, or a placeholder glyph when the duration is unknown.
fn format_duration(seconds: f64) -> String {
    if seconds <= 0.0 {
        return "⋯".to_string();
    }
    let total = seconds as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn parent_of(path: &str) -> String {
    match Path::new(path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().into_owned(),
        _ => "/".to_string(),
    }
}

fn render_listing(path: &str, items: &[crate::browse::Entry]) -> String {
    use crate::browse::EntryKind;

    let mut html = String::from(r#"<ul class="file-list">"#);

    if path != "/" {
        let parent = escape_html(&parent_of(path));
        let _ = write!(
            html,
            r##"
<li hx-get="/api/browse/html?path={parent}" hx-trigger="click" hx-target="#path-browser">
  <span class="material-symbols-rounded">folder</span>
  <span>..</span>
</li>"##
        );
    }

    for item in items {
        let item_path = escape_html(&item.path);
        let display = escape_html(&format_name(&item.name));
        match item.kind {
            EntryKind::Directory => {
                let _ = write!(
                    html,
                    r##"
<li hx-get="/api/browse/html?path={item_path}" hx-trigger="click" hx-target="#path-browser">
  <span class="material-symbols-rounded">folder</span>
  <span>{display}</span>
</li>"##
                );
            }
            EntryKind::Video => {
                let duration = format_duration(item.duration);
                let _ = write!(
                    html,
                    r#"
<li onclick="playVideo('{item_path}')">
  <span class="material-symbols-rounded video" data-hide-in-expanded="true">movie_info</span>
  <img class="thumbnail" src="/api/video/thumbnail?path={item_path}" loading="lazy" alt="">
  <span class="name">{display}</span>
  <span class="duration">{duration}</span>
</li>"#
                );
            }
        }
    }

    html.push_str("\n</ul>");
    html
}
