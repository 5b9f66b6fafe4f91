//! Embedded static asset serving.

use std::borrow::Cow;

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::{Mime, MimeGuess};

use crate::application::error::ErrorReport;

static STATIC_PUBLIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static/public");

/// Serve embedded public static assets.
pub async fn serve_public(path: Option<Path<String>>) -> Response {
    serve_static(&STATIC_PUBLIC_ASSETS, path, "infra::assets::serve_public")
}

fn serve_static(
    bundle: &'static Dir<'static>,
    path: Option<Path<String>>,
    source: &'static str,
) -> Response {
    let captured = path.map(|Path(value)| value);
    match resolve_asset(bundle, captured) {
        Some(asset) => asset.into_response(),
        None => not_found_response(source),
    }
}

fn not_found_response(source: &'static str) -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Static asset not found")
        .attach(&mut response);
    response
}

struct Asset<'a> {
    contents: Cow<'a, [u8]>,
    mime: MimeGuess,
}

fn resolve_asset(bundle: &'static Dir<'static>, path: Option<String>) -> Option<Asset<'static>> {
    let mut candidate = path.unwrap_or_default();
    if candidate.starts_with('/') {
        candidate = candidate.trim_start_matches('/').to_string();
    }

    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        // Avoid directory traversal and disallow directory listings.
        return None;
    }

    let file = bundle.get_file(&candidate)?;
    let mime = mime_guess::from_path(&candidate);
    Some(Asset {
        contents: Cow::Borrowed(file.contents()),
        mime,
    })
}

impl IntoResponse for Asset<'static> {
    fn into_response(self) -> Response {
        let mime = self.mime.first_or_octet_stream();
        match self.contents {
            Cow::Borrowed(slice) => build_response(Bytes::from_static(slice), mime),
            Cow::Owned(bytes) => build_response(Bytes::from(bytes), mime),
        }
    }
}

fn build_response(bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=3600"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_paths_are_rejected() {
        assert!(resolve_asset(&STATIC_PUBLIC_ASSETS, Some("../Cargo.toml".into())).is_none());
        assert!(resolve_asset(&STATIC_PUBLIC_ASSETS, Some("".into())).is_none());
        assert!(resolve_asset(&STATIC_PUBLIC_ASSETS, Some("js/".into())).is_none());
    }

    #[test]
    fn cache_script_persists_and_purges_every_key() {
        let asset = resolve_asset(&STATIC_PUBLIC_ASSETS, Some("listing-cache.js".into()))
            .expect("bundled script");
        let script = std::str::from_utf8(asset.contents.as_ref()).expect("utf-8 script");

        for key in [
            "bazari.ads.cache",
            "bazari.cache.version",
            "bazari.favorites",
            "bazari.identity",
        ] {
            assert!(script.contains(key), "script no longer manages {key}");
        }

        // The purge drops every persisted key in one place so a version
        // mismatch leaves nothing behind from the old schema.
        let purge = script
            .split("function purge()")
            .nth(1)
            .and_then(|rest| rest.split("function checkVersion").next())
            .expect("purge function present");
        assert!(purge.contains("STORAGE_KEY"));
        assert!(purge.contains("FAVORITES_KEY"));
        assert!(purge.contains("IDENTITY_KEY"));
        assert!(purge.contains("VERSION_KEY"));
    }

    #[test]
    fn bundled_script_resolves_with_mime() {
        let asset = resolve_asset(&STATIC_PUBLIC_ASSETS, Some("listing-cache.js".into()))
            .expect("bundled script");
        assert!(
            asset
                .mime
                .first_or_octet_stream()
                .essence_str()
                .contains("javascript")
        );
    }
}
