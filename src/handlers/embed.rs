//! Embed loader script asset.
//!
//! `GET /embed.js` serves the client-side loader third-party pages include
//! via the snippet from key issuance. The script is compiled into the
//! binary; there is no file I/O at request time.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// The loader script, baked in at compile time.
const EMBED_JS: &str = include_str!("../../assets/embed.js");

/// Serve the embed loader script.
///
/// Cached briefly so busy host pages don't refetch it on every load, but
/// short enough that loader fixes roll out quickly.
pub async fn embed_script() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        EMBED_JS,
    )
        .into_response()
}
