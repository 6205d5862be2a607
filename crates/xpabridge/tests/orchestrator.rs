//! Integration tests for the client and multi-target orchestration over an
//! in-memory name server.

use std::sync::Arc;

use xpabridge::prelude::*;
use xpabridge::session::SessionError;
use xpabridge::transport::{Method, Responder};

/// Answers `file` with its own title.
struct Titled(&'static str);

impl Responder for Titled {
    fn get(&self, params: Option<&str>) -> Result<Vec<u8>, String> {
        match params {
            Some("file") => Ok(format!("{}.fits\n", self.0).into_bytes()),
            other => Err(format!("unknown command: {}", other.unwrap_or(""))),
        }
    }

    fn set(&self, _params: Option<&str>, _payload: &[u8]) -> Result<(), String> {
        Ok(())
    }
}

fn three_viewers() -> (Arc<MemoryTransport>, Vec<String>) {
    let transport = Arc::new(MemoryTransport::new());
    let ids = ["pytest2", "pytest3", "pytest4"]
        .iter()
        .zip(["a", "b", "c"])
        .map(|(name, file)| transport.register("DS9", name, Titled(file)))
        .collect();
    (transport, ids)
}

// =========================================================================
// open_all
// =========================================================================

#[tokio::test]
async fn test_open_all_binds_in_resolution_order() {
    let (transport, ids) = three_viewers();

    let mut sessions = open_all(
        Arc::clone(&transport),
        "pytest*",
        1024,
        &SessionConfig::default(),
    )
    .await
    .unwrap();

    let bound: Vec<&str> = sessions.iter().map(Session::id).collect();
    assert_eq!(bound, ids.iter().map(String::as_str).collect::<Vec<_>>());

    let mut files = Vec::new();
    for session in &mut sessions {
        assert_eq!(session.template(), session.id());
        files.push(session.get_text("file").await.unwrap());
    }
    assert_eq!(files, vec!["a.fits", "b.fits", "c.fits"]);
}

#[tokio::test]
async fn test_open_all_without_match_fails() {
    let (transport, _) = three_viewers();

    let err = open_all(transport, "m31*", 1024, &SessionConfig::default())
        .await
        .err()
        .unwrap();

    assert!(err.is_no_target());
    assert_eq!(err.to_string(), "no active target found for template: m31*");
}

#[tokio::test]
async fn test_open_all_accepts_shared_names() {
    let transport = Arc::new(MemoryTransport::new());
    transport.register("DS9", "twin", Titled("left"));
    transport.register("DS9", "twin", Titled("right"));

    let sessions = open_all(transport, "twin", 1024, &SessionConfig::default())
        .await
        .unwrap();
    assert_eq!(sessions.len(), 2);
}

#[tokio::test]
async fn test_open_all_respects_max_targets() {
    let (transport, ids) = three_viewers();

    let sessions = open_all(transport, "DS9:*", 2, &SessionConfig::default())
        .await
        .unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[1].id(), ids[1]);
}

// =========================================================================
// XpaClient
// =========================================================================

#[tokio::test]
async fn test_client_targets_and_open() {
    let (transport, ids) = three_viewers();
    let client = XpaClientBuilder::new().build_with(transport);

    let targets = client.targets(MATCH_ALL).await.unwrap();
    assert_eq!(targets.len(), 3);
    assert_eq!(targets[0], Target::new("DS9:pytest2", ids[0].clone()));
    assert!(client.targets("nobody").await.unwrap().is_empty());

    let mut session = client.open("pytest3").await.unwrap();
    assert_eq!(session.id(), ids[1]);
    assert_eq!(
        session.get(Some("file")).await.unwrap(),
        Response::Text("b.fits".into())
    );

    let err = client.open(MATCH_ALL).await.err().unwrap();
    assert!(matches!(
        err,
        XpaBridgeError::Session(SessionError::Ambiguous { ref matches, .. }) if matches.len() == 3
    ));
}

#[tokio::test]
async fn test_ensure_name_server_leaves_running_one_alone() {
    let (transport, _) = three_viewers();
    transport.register("XPA", "xpans", Titled("ns"));
    let client = XpaClientBuilder::new().build_with(Arc::clone(&transport));

    assert!(!client.ensure_name_server().await.unwrap());
    assert_eq!(transport.requests().last(), Some(&(Method::Access, "xpans".to_string())));
}

#[tokio::test]
async fn test_ensure_name_server_needs_executable() {
    let transport = Arc::new(MemoryTransport::new());
    let client = XpaClientBuilder::new()
        .programs(Programs {
            name_server: "xpans-not-installed".into(),
            bin_dir: None,
            search_path: false,
            ..Programs::default()
        })
        .build_with(transport);

    let err = client.ensure_name_server().await.unwrap_err();
    assert_eq!(err.to_string(), "can't locate xpans-not-installed executable");
}

#[test]
fn test_session_config_from_json_feeds_builder() {
    let config = SessionConfig::from_json(r#"{ "verify": false, "max_targets": 8 }"#).unwrap();
    let transport = Arc::new(MemoryTransport::new());
    let client = XpaClientBuilder::new()
        .session_config(config)
        .build_with(transport);

    assert!(!client.config().verify);
    assert_eq!(client.config().max_targets, 8);
    assert_eq!(client.config().programs, Programs::default());
}
