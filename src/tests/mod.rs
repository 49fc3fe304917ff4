use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::config::SourceConfig;
use crate::records::ZapRecord;
use crate::server::{self, AppState};
use crate::source;
use crate::view::filters::TagField;
use crate::view::{run_load, FilterView, LoadState};

fn spawn_router(router: Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    listener.set_nonblocking(true).unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(router.into_make_service());
    tokio::spawn(server);
    format!("http://{addr}")
}

// A stand-in for the external tabular API: two pages chained by an offset
// token, with deliberately messy field bags.
fn fake_upstream_router(fail_second_page: bool) -> Router {
    Router::new().route(
        "/:base/:table",
        get(
            move |Query(params): Query<HashMap<String, String>>| async move {
                match params.get("offset").map(|s| s.as_str()) {
                    None => Json(json!({
                        "records": [
                            {"id": "rec1", "fields": {
                                "Pseudo ZAP": "Alice",
                                "Présentation": "jazz fan",
                                "Styles de musique": ["Jazz"],
                                "Instruments": ["Sax"],
                                "Role(s) Communauté(s)": "CA Orga",
                            }},
                            {"id": "rec2", "fields": {
                                "Pseudo ZAP": "Bob",
                                "Présentation": 42,
                                "Styles de musique": "Rock",
                            }},
                        ],
                        "offset": "page2",
                    }))
                    .into_response(),
                    Some(_) if fail_second_page => {
                        StatusCode::INTERNAL_SERVER_ERROR.into_response()
                    }
                    Some(_) => Json(json!({
                        "records": [
                            {"id": "rec3", "fields": {
                                "Pseudo ZAP": "Chloé",
                                "Styles de musique": ["Rock", "Jazz"],
                                "Role(s) Communauté(s)": "Tech  Son",
                            }},
                        ],
                    }))
                    .into_response(),
                }
            },
        ),
    )
}

fn state_for(api_url: String) -> Arc<AppState> {
    Arc::new(AppState {
        client: source::build_client(5).unwrap(),
        source: SourceConfig {
            api_url,
            api_key: "key".to_string(),
            base_id: "appTest".to_string(),
            table: "Membres ZAP".to_string(),
            view: "Membres cotisants".to_string(),
            timeout_seconds: 5,
        },
    })
}

#[tokio::test]
async fn served_records_are_normalized_across_pages_in_order() {
    let upstream = spawn_router(fake_upstream_router(false));
    let base = spawn_router(server::router(state_for(upstream)));

    let response = reqwest::get(format!("{base}/api/zap-records"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let records: Vec<ZapRecord> = response.json().await.unwrap();

    let pseudos: Vec<&str> = records.iter().map(|r| r.pseudo.as_str()).collect();
    assert_eq!(pseudos, vec!["Alice", "Bob", "Chloé"]);

    // mistyped cells were defaulted, not propagated
    assert_eq!(records[1].presentation, "");
    assert!(records[1].styles.is_empty());
    assert_eq!(
        records[2].roles,
        vec!["Tech".to_string(), "Son".to_string()]
    );
}

#[tokio::test]
async fn upstream_failure_mid_pagination_yields_a_500_and_no_partial_set() {
    let upstream = spawn_router(fake_upstream_router(true));
    let base = spawn_router(server::router(state_for(upstream)));

    let response = reqwest::get(format!("{base}/api/zap-records"))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.text().await.unwrap(), "server error");
}

#[tokio::test]
async fn view_loads_and_filters_against_a_live_server() {
    let upstream = spawn_router(fake_upstream_router(false));
    let base = spawn_router(server::router(state_for(upstream)));

    let client = reqwest::Client::new();
    let (mut view, ticket) = FilterView::mount();
    run_load(&mut view, ticket, &client, &base).await;

    assert_eq!(view.load_state(), LoadState::Loaded);
    assert_eq!(view.filtered().len(), 3);

    view.set_selected(TagField::Styles, vec!["Rock".to_string()]);
    assert_eq!(view.filtered().len(), 1);
    assert_eq!(view.filtered()[0].pseudo, "Chloé");

    // option sets still derive from the full record set
    let options = view.options(TagField::Styles);
    assert!(options.contains(&"Jazz".to_string()));
    assert!(options.contains(&"Rock".to_string()));
}

#[tokio::test]
async fn view_load_failure_settles_into_an_empty_table() {
    let upstream = spawn_router(fake_upstream_router(true));
    let base = spawn_router(server::router(state_for(upstream)));

    let client = reqwest::Client::new();
    let (mut view, ticket) = FilterView::mount();
    run_load(&mut view, ticket, &client, &base).await;

    assert_eq!(view.load_state(), LoadState::LoadedEmpty);
    assert!(view.filtered().is_empty());
    assert!(!view.is_loading());
}

#[tokio::test]
async fn view_unmounted_before_resolution_ignores_the_result() {
    let upstream = spawn_router(fake_upstream_router(false));
    let base = spawn_router(server::router(state_for(upstream)));

    let client = reqwest::Client::new();
    let (mut view, ticket) = FilterView::mount();
    view.unmount();
    run_load(&mut view, ticket, &client, &base).await;

    assert!(view.records().is_empty());
    assert!(view.filtered().is_empty());
}
