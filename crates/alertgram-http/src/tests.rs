use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{self, Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt;

use alertgram_core::{
    delivery::{DeliveryCoordinator, FAILURE_NOTICE},
    domain::{ChatId, MessageId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, OutgoingMessage, SentMessage, TextMode},
    },
    pipeline::AlertPipeline,
    render::{RenderSettings, Renderer},
    templates::{FsTemplateLoader, TemplateStore},
    Result,
};

use crate::{handlers::SENT_BODY, router, AppState};

/// Records every send. Fails the listed 1-based alert sends, and every plain
/// send when `fail_plain` is set.
#[derive(Default)]
struct FakeMessenger {
    fail_alerts: Vec<usize>,
    fail_plain: bool,
    alert_count: Mutex<usize>,
    log: Mutex<Vec<OutgoingMessage>>,
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 4096,
        }
    }

    async fn send(&self, msg: OutgoingMessage) -> Result<SentMessage> {
        let chat_id = msg.chat_id;
        let plain = msg.mode == TextMode::Plain;
        self.log.lock().unwrap().push(msg);

        if plain {
            if self.fail_plain {
                return Err(Error::External("telegram error: Forbidden".to_string()));
            }
            return Ok(SentMessage {
                chat_id,
                message_id: MessageId(0),
            });
        }

        let n = {
            let mut guard = self.alert_count.lock().unwrap();
            *guard += 1;
            *guard
        };
        if self.fail_alerts.contains(&n) {
            return Err(Error::External(format!(
                "telegram error: Bad Request: can't parse entities in chunk {n}"
            )));
        }
        Ok(SentMessage {
            chat_id,
            message_id: MessageId(n as i32),
        })
    }
}

impl FakeMessenger {
    fn sends(&self) -> Vec<OutgoingMessage> {
        self.log.lock().unwrap().clone()
    }

    /// Delivery finishes after the response; poll until `n` sends have landed.
    async fn wait_for(&self, n: usize) -> Vec<OutgoingMessage> {
        for _ in 0..400 {
            let sends = self.sends();
            if sends.len() >= n {
                return sends;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} sends, got {:?}", self.sends());
    }
}

struct Harness {
    dir: tempfile::TempDir,
    messenger: Arc<FakeMessenger>,
    state: AppState,
}

async fn harness(default_src: &str, messenger: FakeMessenger) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let default_path = dir.path().join("default.tmpl");
    std::fs::write(&default_path, default_src).unwrap();

    let store = TemplateStore::new(Arc::new(FsTemplateLoader), default_path, false)
        .await
        .unwrap();
    let renderer = Renderer::new(RenderSettings {
        time_zone: chrono_tz::UTC,
        date_format: "%Y-%m-%d".to_string(),
    });
    let pipeline = AlertPipeline::new(
        Arc::new(store),
        Arc::new(renderer),
        NonZeroUsize::new(4000).unwrap(),
    );

    let messenger = Arc::new(messenger);
    let state = AppState {
        pipeline: Arc::new(pipeline),
        coordinator: DeliveryCoordinator::new(messenger.clone(), false),
        messenger: messenger.clone(),
        debug: true,
    };

    Harness {
        dir,
        messenger,
        state,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .header(http::header::CONTENT_TYPE, "application/json")
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(resp: Response) -> String {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

fn keys(v: &Value) -> Vec<String> {
    let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn ping_sends_test_message() {
    let h = harness("x", FakeMessenger::default()).await;

    let resp = router(h.state.clone()).oneshot(get("/ping/7")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let text = body_text(resp).await;
    assert!(text.ends_with(" 7"), "{text}");

    let sends = h.messenger.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].chat_id, ChatId(7));
    assert_eq!(sends[0].text, text);
    assert_eq!(sends[0].mode, TextMode::Plain);
}

#[tokio::test]
async fn ping_failure_is_bad_request() {
    let h = harness(
        "x",
        FakeMessenger {
            fail_plain: true,
            ..Default::default()
        },
    )
    .await;

    let resp = router(h.state.clone()).oneshot(get("/ping/7")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(keys(&json), vec!["err", "message"]);
    assert!(json["err"].as_str().unwrap().contains("Forbidden"));
    assert!(json["message"].is_null());
}

#[tokio::test]
async fn malformed_chat_id_sends_nothing() {
    let h = harness("x", FakeMessenger::default()).await;

    for req in [get("/ping/abc"), post("/alert/abc", "{}")] {
        let resp = router(h.state.clone()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(resp).await;
        assert_eq!(keys(&json), vec!["err"]);
        assert!(json["err"].as_str().unwrap().contains("abc"));
    }
    assert!(h.messenger.sends().is_empty());
}

#[tokio::test]
async fn long_alert_is_split_and_sent_in_order() {
    let h = harness(
        "{% for a in alerts %}{{ a.status }}{% endfor %}{{ filler }}",
        FakeMessenger::default(),
    )
    .await;

    let body = serde_json::json!({
        "alerts": [{"status": "firing"}],
        "filler": "y".repeat(8994),
    })
    .to_string();
    let resp = router(h.state.clone())
        .oneshot(post("/alert/42", &body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, SENT_BODY);

    let sends = h.messenger.wait_for(3).await;
    let sizes: Vec<usize> = sends.iter().map(|m| m.text.chars().count()).collect();
    assert_eq!(sizes, vec![4000, 4000, 1000]);
    assert!(sends[0].text.starts_with("firing"));
    for m in &sends {
        assert_eq!(m.chat_id, ChatId(42));
        assert_eq!(m.mode, TextMode::Html);
        assert!(m.disable_link_preview);
    }
}

#[tokio::test]
async fn first_chunk_failure_reports_full_text_and_notifies_chat() {
    let h = harness(
        "{{ filler }}",
        FakeMessenger {
            fail_alerts: vec![1],
            ..Default::default()
        },
    )
    .await;

    let filler = "z".repeat(4500);
    let body = serde_json::json!({ "filler": filler }).to_string();
    let resp = router(h.state.clone())
        .oneshot(post("/alert/42", &body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(resp).await;
    assert_eq!(keys(&json), vec!["err", "message", "srcmsg"]);
    assert!(json["err"].as_str().unwrap().contains("can't parse entities"));
    assert!(json["message"].is_null());
    assert_eq!(json["srcmsg"].as_str().unwrap(), filler);

    // Failed chunk, notice, then the second chunk still goes out.
    let sends = h.messenger.wait_for(3).await;
    assert_eq!(sends[1].text, FAILURE_NOTICE);
    assert_eq!(sends[2].text.chars().count(), 500);
}

#[tokio::test]
async fn named_template_from_query() {
    let h = harness("default {{ status }}", FakeMessenger::default()).await;
    let named = h.dir.path().join("short.tmpl");
    std::fs::write(&named, "short {{ status }}").unwrap();

    let uri = format!("/alert/5?template={}", named.display());
    let resp = router(h.state.clone())
        .oneshot(post(&uri, r#"{"status":"resolved"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let uri = "/alert/5?template=/nonexistent/alertgram.tmpl";
    let resp = router(h.state.clone())
        .oneshot(post(uri, r#"{"status":"firing"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let texts: Vec<String> = h
        .messenger
        .wait_for(2)
        .await
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, vec!["short resolved", "default firing"]);
}

#[tokio::test]
async fn render_error_is_request_scoped() {
    let h = harness("{{ missing.labels.alertname }}", FakeMessenger::default()).await;

    let resp = router(h.state.clone())
        .oneshot(post("/alert/1", "{}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(resp).await;
    assert!(json["err"].as_str().unwrap().contains("default"));

    // The server keeps serving.
    let resp = router(h.state.clone()).oneshot(get("/ping/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_object_body_is_rejected() {
    let h = harness("x", FakeMessenger::default()).await;

    for body in ["not json", "[1,2,3]"] {
        let resp = router(h.state.clone())
            .oneshot(post("/alert/1", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(keys(&json), vec!["err"]);
    }
    assert!(h.messenger.sends().is_empty());
}

#[tokio::test]
async fn empty_render_sends_nothing() {
    let h = harness(
        "{% if status %}{{ status }}{% endif %}",
        FakeMessenger::default(),
    )
    .await;

    let resp = router(h.state.clone())
        .oneshot(post("/alert/1", "{}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.is_empty());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.messenger.sends().is_empty());
}
