use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;

use footfall_core::config::Config;
use footfall_core::visits::{VisitBackend, WindowStats};
use footfall_duckdb::DuckDbBackend;
use footfall_server::app::build_app;
use footfall_server::state::AppState;

const KNOWN_VID: &str = "0123456789abcdef0123456789abcdef";

fn tracking_config() -> Config {
    Config {
        database_url: Some(":memory:".to_string()),
        admin_token: Some("token".to_string()),
        ..Config::default()
    }
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
) -> axum::http::Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::empty()).expect("build request");
    app.oneshot(request).await.expect("request")
}

async fn all_time(state: &AppState) -> WindowStats {
    state.flush_visits().await;
    state
        .visits
        .as_ref()
        .expect("configured")
        .window_stats(Utc::now())
        .await
        .expect("stats")
        .all
}

fn set_cookie(response: &axum::http::Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ============================================================
// BDD: First visit mints a visitor cookie
// ============================================================
#[tokio::test]
async fn test_first_visit_sets_vid_cookie_and_records() {
    let state = Arc::new(AppState::new(tracking_config()));
    let app = build_app(Arc::clone(&state));

    let response = send(app, "GET", "/blog/hello", None).await;
    // No route serves pages here; the visit still counts.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let cookie = set_cookie(&response).expect("Set-Cookie header");
    let (pair, attributes) = cookie.split_once("; ").expect("cookie attributes");
    let vid = pair.strip_prefix("vid=").expect("vid cookie");
    assert_eq!(vid.len(), 32);
    assert!(vid.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    assert_eq!(
        attributes,
        "Max-Age=31536000; Path=/; HttpOnly; SameSite=Lax; Secure"
    );

    assert_eq!(
        all_time(&state).await,
        WindowStats {
            page_views: 1,
            unique_visitors: 1
        }
    );
}

// ============================================================
// BDD: Returning visitors keep their id
// ============================================================
#[tokio::test]
async fn test_returning_visitor_reuses_cookie() {
    let state = Arc::new(AppState::new(tracking_config()));
    let app = build_app(Arc::clone(&state));
    let cookie = format!("theme=dark; vid={KNOWN_VID}");

    for path in ["/", "/about", "/pricing"] {
        let response = send(app.clone(), "GET", path, Some(&cookie)).await;
        assert!(set_cookie(&response).is_none(), "{path}");
    }

    assert_eq!(
        all_time(&state).await,
        WindowStats {
            page_views: 3,
            unique_visitors: 1
        }
    );
}

#[tokio::test]
async fn test_short_vid_is_replaced() {
    let state = Arc::new(AppState::new(tracking_config()));
    let app = build_app(Arc::clone(&state));

    let response = send(app, "GET", "/", Some("vid=tooshort")).await;
    let cookie = set_cookie(&response).expect("fresh cookie");
    assert!(!cookie.contains("tooshort"));
}

#[tokio::test]
async fn test_non_ascii_neighbour_cookie_keeps_vid() {
    let db = Arc::new(DuckDbBackend::in_memory());
    let backend: Arc<dyn VisitBackend> = db.clone();
    let state = Arc::new(AppState::with_backend(tracking_config(), Some(backend)));
    let app = build_app(Arc::clone(&state));

    let raw = format!("name=Jos\u{e9}; vid={KNOWN_VID}");
    let cookie = HeaderValue::from_bytes(raw.as_bytes()).expect("raw cookie bytes");
    for path in ["/", "/about"] {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .header(header::COOKIE, cookie.clone())
            .body(Body::empty())
            .expect("build request");
        let response = app.clone().oneshot(request).await.expect("request");
        assert!(set_cookie(&response).is_none(), "{path}");
    }

    state.flush_visits().await;
    let guard = db.conn_for_test().await;
    let conn = guard.as_ref().expect("schema opened the connection");
    let mut stmt = conn
        .prepare("SELECT DISTINCT visitor_id FROM visits")
        .expect("prepare");
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows");
    assert_eq!(ids, vec![KNOWN_VID.to_string()]);
}

// ============================================================
// BDD: Non-page requests are not tracked
// ============================================================
#[tokio::test]
async fn test_filtered_requests_are_not_recorded() {
    let state = Arc::new(AppState::new(tracking_config()));
    let app = build_app(Arc::clone(&state));

    let requests = [
        ("POST", "/"),
        ("GET", "/healthz"),
        ("GET", "/admin/visits"),
        ("GET", "/static/app.js"),
        ("GET", "/logo.PNG"),
        ("GET", "/robots.txt"),
    ];
    for (method, uri) in requests {
        let response = send(app.clone(), method, uri, None).await;
        assert!(set_cookie(&response).is_none(), "{method} {uri}");
    }

    assert_eq!(all_time(&state).await, WindowStats::default());
}

// ============================================================
// BDD: Tracking is inert without a database
// ============================================================
#[tokio::test]
async fn test_no_tracking_without_database() {
    let state = Arc::new(AppState::new(Config::default()));
    let app = build_app(Arc::clone(&state));

    let response = send(app, "GET", "/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(set_cookie(&response).is_none());
    assert_eq!(state.recorder.pending().await, 0);
}

// ============================================================
// BDD: Storage failure never reaches the visitor
// ============================================================
#[tokio::test]
async fn test_broken_store_does_not_affect_responses() {
    let config = Config {
        database_url: Some("/nonexistent-footfall-dir/nested/visits.db".to_string()),
        ..tracking_config()
    };
    let state = Arc::new(AppState::new(config));
    let app = build_app(Arc::clone(&state));

    let response = send(app.clone(), "GET", "/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(set_cookie(&response).is_some());

    state.flush_visits().await;
    let counters = state.recorder.counters();
    assert_eq!(counters.failed, 1);

    let response = send(app, "GET", "/again", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================
// BDD: The background loop drains the buffer on its own
// ============================================================
#[tokio::test]
async fn test_flush_loop_persists_visits() {
    let config = Config {
        flush_interval_ms: 10,
        ..tracking_config()
    };
    let state = Arc::new(AppState::new(config));
    let flusher = tokio::spawn(Arc::clone(&state).run_visit_flush_loop());
    let app = build_app(Arc::clone(&state));

    send(app, "GET", "/", Some(&format!("vid={KNOWN_VID}"))).await;

    let mut recorded = 0;
    for _ in 0..200 {
        recorded = state.recorder.counters().recorded;
        if recorded == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    flusher.abort();
    assert_eq!(recorded, 1);
}

#[tokio::test]
async fn test_long_paths_are_truncated_not_rejected() {
    let state = Arc::new(AppState::new(tracking_config()));
    let app = build_app(Arc::clone(&state));
    let uri = format!("/{}", "a".repeat(900));

    let response = send(app, "GET", &uri, Some(&format!("vid={KNOWN_VID}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(all_time(&state).await.page_views, 1);
}
