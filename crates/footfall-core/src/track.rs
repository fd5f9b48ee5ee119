/// Liveness path, never counted as a page view.
pub const HEALTH_PATH: &str = "/healthz";

/// Everything under this prefix is operator traffic.
pub const ADMIN_PREFIX: &str = "/admin";

/// Longest path stored with a visit; longer paths are truncated.
pub const MAX_PATH_CHARS: usize = 512;

const STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "map", "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "txt", "xml",
];

/// Decide whether a request counts as a page view.
///
/// Only `GET` requests are tracked, excluding the health check, the admin
/// surface and common static assets (extension match is case-insensitive).
pub fn should_track(method: &str, path: &str) -> bool {
    if method != "GET" {
        return false;
    }
    if path == HEALTH_PATH || path.starts_with(ADMIN_PREFIX) {
        return false;
    }
    !is_static_asset(path)
}

fn is_static_asset(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => STATIC_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Clip `path` to [`MAX_PATH_CHARS`] characters.
pub fn truncate_path(path: &str) -> String {
    match path.char_indices().nth(MAX_PATH_CHARS) {
        Some((idx, _)) => path[..idx].to_string(),
        None => path.to_string(),
    }
}
