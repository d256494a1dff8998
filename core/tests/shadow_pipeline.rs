/*
 * shadow_pipeline.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration test for the shadow pipeline. Drives the full command loop
 * with recording collaborators: initial shadow sync through to steady
 * state, delta and event-log decoding, publish forwarding, and the
 * disconnect/reconnect resume path.
 *
 * Run with:
 *   cargo test -p pontile_core --test shadow_pipeline -- --nocapture
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::BytesMut;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use pontile_core::config::GatewayConfig;
use pontile_core::protocol::shadow::{
    CloudSession, FotaImage, FotaRegistry, SessionError, ShadowCommand, ShadowEvent,
    ShadowPipeline,
};

/// CloudSession that records every call for inspection.
#[derive(Default)]
struct RecordingSession {
    calls: Mutex<Vec<String>>,
    fail_subscribe: AtomicBool,
}

impl RecordingSession {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CloudSession for RecordingSession {
    fn subscribe(&self, topic: &str) -> Result<(), SessionError> {
        self.record(format!("subscribe {}", topic));
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(SessionError::new("broker unavailable"));
        }
        Ok(())
    }
    fn unsubscribe(&self, topic: &str) -> Result<(), SessionError> {
        self.record(format!("unsubscribe {}", topic));
        Ok(())
    }
    fn request_shadow(&self) -> Result<(), SessionError> {
        self.record("get".to_string());
        Ok(())
    }
    fn publish(&self, topic: &str, _payload: &str) -> Result<(), SessionError> {
        self.record(format!("publish {}", topic));
        Ok(())
    }
    fn set_shadow_generation(&self, enabled: bool) {
        self.record(format!("generation {}", enabled));
    }
}

#[derive(Default)]
struct RecordingFota {
    calls: Mutex<Vec<String>>,
}

impl RecordingFota {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl FotaRegistry for RecordingFota {
    fn set_desired_version(&self, image: FotaImage, version: &str) {
        self.record(format!("version/{}/{}", image.key(), version));
    }
    fn set_desired_filename(&self, image: FotaImage, filename: &str) {
        self.record(format!("filename/{}/{}", image.key(), filename));
    }
    fn set_switchover(&self, image: FotaImage, value: u32) {
        self.record(format!("switchover/{}/{}", image.key(), value));
    }
    fn set_start(&self, image: FotaImage, value: u32) {
        self.record(format!("start/{}/{}", image.key(), value));
    }
    fn set_error_count(&self, image: FotaImage, value: u32) {
        self.record(format!("errors/{}/{}", image.key(), value));
    }
    fn set_host(&self, host: &str) {
        self.record(format!("host/{}", host));
    }
    fn set_block_size(&self, value: u32) {
        self.record(format!("blocksize/{}", value));
    }
}

fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::new("354616090298915");
    config.retry_delay = Duration::from_millis(10);
    config
}

fn start(
    config: &GatewayConfig,
) -> (
    ShadowPipeline,
    mpsc::Receiver<ShadowEvent>,
    Arc<RecordingSession>,
    Arc<RecordingFota>,
) {
    let _ = env_logger::builder().is_test(true).try_init();
    let session = Arc::new(RecordingSession::default());
    let fota = Arc::new(RecordingFota::default());
    let (pipeline, events) =
        ShadowPipeline::start(config.clone(), session.clone(), fota.clone());
    (pipeline, events, session, fota)
}

async fn next_event(events: &mut mpsc::Receiver<ShadowEvent>) -> ShadowEvent {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for shadow event")
        .expect("event channel closed")
}

#[tokio::test]
async fn initial_sync_reaches_steady_state() {
    let config = test_config();
    let (pipeline, mut events, session, fota) = start(&config);

    pipeline.send(ShadowCommand::Connected);
    assert_eq!(next_event(&mut events).await, ShadowEvent::Connected);

    // The full gateway shadow, as delivered on get/accepted: whitelist,
    // FOTA metadata, and the metadata block that must be truncated away.
    let payload = BytesMut::from(
        &br#"{"state":{"reported":{"bt510":{"sensors":[["AABBCCDDEEFF",466280,true],["112233445566",466281,false]]},"app":{"desired":"2.1.0","switchover":10},"fwBridge":"bridge.example.com","blockSize":512}},"metadata":{"reported":{"blockSize":{"timestamp":1604000000}}}}"#[..],
    );
    pipeline.send(ShadowCommand::Publish {
        topic: config.get_accepted_topic(),
        payload,
    });

    match next_event(&mut events).await {
        ShadowEvent::Whitelist { sensors } => {
            assert_eq!(sensors.len(), 2);
            assert_eq!(sensors[0].address, "AABBCCDDEEFF");
            assert!(sensors[0].whitelisted);
            assert!(!sensors[1].whitelisted);
        }
        other => panic!("expected whitelist, got {:?}", other),
    }
    assert_eq!(next_event(&mut events).await, ShadowEvent::ShadowInitComplete);
    assert_eq!(next_event(&mut events).await, ShadowEvent::ShadowRequest);

    let calls = session.calls();
    assert_eq!(calls[0], format!("subscribe {}", config.get_accepted_topic()));
    assert!(calls.contains(&"get".to_string()));
    assert!(calls.contains(&format!("unsubscribe {}", config.get_accepted_topic())));
    assert!(calls.contains(&format!("subscribe {}", config.gateway_topic())));
    assert!(calls.contains(&"generation true".to_string()));

    let fota_calls = fota.calls();
    assert!(fota_calls.contains(&"version/app/2.1.0".to_string()));
    assert!(fota_calls.contains(&"switchover/app/10".to_string()));
    assert!(fota_calls.contains(&"host/bridge.example.com".to_string()));
    assert!(fota_calls.contains(&"blocksize/512".to_string()));
}

#[tokio::test]
async fn reconnect_resumes_at_gateway_subscribe() {
    let config = test_config();
    let (pipeline, mut events, session, _fota) = start(&config);

    pipeline.send(ShadowCommand::Connected);
    let payload = BytesMut::from(
        &br#"{"state":{"reported":{"bt510":{"sensors":[]}}}}"#[..],
    );
    pipeline.send(ShadowCommand::Publish {
        topic: config.get_accepted_topic(),
        payload,
    });
    // Drain through to steady state.
    loop {
        if next_event(&mut events).await == ShadowEvent::ShadowRequest {
            break;
        }
    }

    session.clear();
    pipeline.send(ShadowCommand::Disconnected);
    assert_eq!(next_event(&mut events).await, ShadowEvent::Disconnected);

    pipeline.send(ShadowCommand::Connected);
    assert_eq!(next_event(&mut events).await, ShadowEvent::Connected);
    assert_eq!(next_event(&mut events).await, ShadowEvent::ShadowRequest);

    // No repeated get/accepted subscribe and no repeated GET: the reconnect
    // goes straight to the gateway topic.
    assert_eq!(
        session.calls(),
        vec![
            "generation false".to_string(),
            format!("subscribe {}", config.gateway_topic()),
            "generation true".to_string(),
        ]
    );
}

#[tokio::test]
async fn failed_subscribe_retries_on_timer() {
    let config = test_config();
    let (pipeline, mut events, session, _fota) = start(&config);
    session.fail_subscribe.store(true, Ordering::SeqCst);

    pipeline.send(ShadowCommand::Connected);
    assert_eq!(next_event(&mut events).await, ShadowEvent::Connected);

    // Let a couple of failing passes elapse, then allow the broker through.
    tokio::time::sleep(Duration::from_millis(30)).await;
    session.fail_subscribe.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let attempt = format!("subscribe {}", config.get_accepted_topic());
    let attempts = session.calls().iter().filter(|c| **c == attempt).count();
    assert!(
        attempts >= 2,
        "expected retries, saw {:?}",
        session.calls()
    );

    // Once the subscribe sticks the flag is set and no further attempts run.
    tokio::time::sleep(Duration::from_millis(40)).await;
    let later = session.calls().iter().filter(|c| **c == attempt).count();
    assert_eq!(later, attempts);
}

#[tokio::test]
async fn delta_produces_config_request() {
    let config = test_config();
    let (pipeline, mut events, _session, _fota) = start(&config);

    let payload = BytesMut::from(&br#"{"state":{"led":1},"configVersion":7}"#[..]);
    pipeline.send(ShadowCommand::Publish {
        topic: "$aws/things/AABBCCDDEEFF/shadow/update/delta".to_string(),
        payload,
    });

    match next_event(&mut events).await {
        ShadowEvent::ConfigRequest {
            address,
            config_version,
            command,
        } => {
            assert_eq!(address, "AABBCCDDEEFF");
            assert_eq!(config_version, 7);
            assert!(command.contains(r#"{"led":1}"#));
        }
        other => panic!("expected config request, got {:?}", other),
    }
}

#[tokio::test]
async fn sensor_get_accepted_replays_event_log() {
    let config = test_config();
    let (pipeline, mut events, _session, _fota) = start(&config);

    let payload = BytesMut::from(
        &br#"{"state":{"reported":{"eventLog":[["01",466280,"0899"],["0C",466300,"0001"]]}}}"#[..],
    );
    pipeline.send(ShadowCommand::Publish {
        topic: "$aws/things/AABBCCDDEEFF/shadow/get/accepted".to_string(),
        payload,
    });

    match next_event(&mut events).await {
        ShadowEvent::ShadowInit { address, events } => {
            assert_eq!(address, "AABBCCDDEEFF");
            assert_eq!(events.len(), 2);
            assert_eq!(events[0].record_type, 0x01);
            assert_eq!(events[0].epoch, 466280);
            assert_eq!(events[0].data, 0x0899);
            assert_eq!(events[1].record_type, 0x0C);
        }
        other => panic!("expected shadow init, got {:?}", other),
    }
}

#[tokio::test]
async fn publish_forwarding_and_ack() {
    let config = test_config();
    let (pipeline, mut events, session, _fota) = start(&config);

    pipeline.send(ShadowCommand::PublishOut {
        topic: String::new(),
        payload: r#"{"state":{"reported":{"sensors":[]}}}"#.to_string(),
        gateway_bound: true,
    });
    assert_eq!(next_event(&mut events).await, ShadowEvent::ShadowAck);
    assert_eq!(
        session.calls(),
        vec![format!("publish {}", config.update_topic())]
    );

    session.clear();
    let sensor_topic = "$aws/things/AABBCCDDEEFF/shadow/update".to_string();
    pipeline.send(ShadowCommand::PublishOut {
        topic: sensor_topic.clone(),
        payload: r#"{"state":{"reported":{"temp":21}}}"#.to_string(),
        gateway_bound: false,
    });
    // Per-sensor forwards keep their topic and are not acknowledged.
    let (done_tx, done_rx) = oneshot::channel();
    pipeline.send(ShadowCommand::Subscribe {
        topic: "a/b".to_string(),
        subscribe: true,
        on_complete: Box::new(move |ok| {
            let _ = done_tx.send(ok);
        }),
    });
    assert!(timeout(Duration::from_secs(2), done_rx)
        .await
        .expect("timed out")
        .expect("callback dropped"));
    assert_eq!(
        session.calls(),
        vec![
            format!("publish {}", sensor_topic),
            "subscribe a/b".to_string(),
        ]
    );
}

#[tokio::test]
async fn single_topic_mode_skips_lifecycle() {
    let mut config = test_config();
    config.single_topic = true;
    let (pipeline, mut events, session, _fota) = start(&config);

    pipeline.send(ShadowCommand::Connected);
    assert_eq!(next_event(&mut events).await, ShadowEvent::Connected);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(session.calls().is_empty());

    // All outbound traffic collapses onto the gateway update topic.
    pipeline.send(ShadowCommand::PublishOut {
        topic: "$aws/things/AABBCCDDEEFF/shadow/update".to_string(),
        payload: "{}".to_string(),
        gateway_bound: false,
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(
        session.calls(),
        vec![format!("publish {}", config.update_topic())]
    );
}
