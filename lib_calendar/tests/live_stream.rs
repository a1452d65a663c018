//! End-to-end exercise of the client against a local WebSocket server
//! standing in for the calendar feed: handshake, keepalive, decode,
//! malformed-message tolerance, in-order forwarding and shutdown join.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use lib_calendar::{CalendarClient, ChannelAggregator, DataAggregator, StreamConfig};

const SLOVENIA_UNEMPLOYMENT: &str = r#"{"event":"Unemployment Rate","country":"Slovenia","category":"Unemployment Rate","ticker":"SVUER","actual":"8.2%","previous":"7.7%","importance":1,"calendarId":236456,"date":"2020-03-20T10:00:00"}"#;

const SLOVENIA_GDP: &str = r#"{"event":"GDP Growth Rate","country":"Slovenia","category":"GDP Growth Rate","ticker":"SVUER","actual":"0.4%","importance":2,"calendarId":236457,"date":"2020-03-20T11:00:00"}"#;

fn local_config(port: u16) -> StreamConfig {
    StreamConfig {
        host: "127.0.0.1".to_string(),
        port,
        user: "demo".to_string(),
        key: "guest".to_string(),
        heartbeat_timeout: Duration::from_secs(5),
        reconnect_cooldown: Duration::from_millis(50),
        override_subscription_check: false,
        supported_countries: HashSet::from(["slovenia".to_string()]),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn streams_decoded_events_in_receipt_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        // The client must declare interest in the calendar topic exactly once.
        let handshake = ws.next().await.unwrap().unwrap();
        assert_eq!(
            handshake.into_text().unwrap().as_str(),
            "{\"topic\": \"subscribe\", \"to\": \"calendar\"}"
        );

        ws.send(Message::Text("{\"topic\":\"keepalive\"}".into()))
            .await
            .unwrap();
        // Trailing transport newline must be stripped by the client.
        ws.send(Message::Text(format!("{SLOVENIA_UNEMPLOYMENT}\r\n").into()))
            .await
            .unwrap();
        // A malformed message must not terminate the connection.
        ws.send(Message::Text("{\"slovenia\": broken".into()))
            .await
            .unwrap();
        ws.send(Message::Text(SLOVENIA_GDP.into())).await.unwrap();

        // Hold the connection open until the client disconnects.
        while let Some(msg) = ws.next().await {
            if msg.is_err() {
                break;
            }
        }
    });

    let aggregator = Arc::new(ChannelAggregator::new());
    let mut client = CalendarClient::new(
        local_config(port),
        aggregator.clone() as Arc<dyn DataAggregator>,
    );
    let mut rx = client.subscribe("SLOVENIA//SVUER");
    client.start();

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("first event should arrive")
        .expect("channel open");
    assert_eq!(first.calendar_id, "236456");
    assert_eq!(first.country, "Slovenia");
    assert!((first.actual - 0.082).abs() < 1e-9);

    // Receipt order survives the malformed message in between.
    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("second event should arrive")
        .expect("channel open");
    assert_eq!(second.calendar_id, "236457");

    assert!(client.is_connected());

    tokio::time::timeout(Duration::from_secs(5), client.shutdown())
        .await
        .expect("shutdown joins");
    assert!(!client.is_connected());

    server.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reconnects_after_the_feed_drops_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        // First session: accept the handshake, then drop immediately.
        {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let _ = ws.next().await;
        }

        // Second session: the reconnected client gets an event.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let handshake = ws.next().await.unwrap().unwrap();
        assert_eq!(
            handshake.into_text().unwrap().as_str(),
            "{\"topic\": \"subscribe\", \"to\": \"calendar\"}"
        );
        ws.send(Message::Text(SLOVENIA_UNEMPLOYMENT.into()))
            .await
            .unwrap();

        while let Some(msg) = ws.next().await {
            if msg.is_err() {
                break;
            }
        }
    });

    let aggregator = Arc::new(ChannelAggregator::new());
    let mut client = CalendarClient::new(
        local_config(port),
        aggregator.clone() as Arc<dyn DataAggregator>,
    );
    let mut rx = client.subscribe("SLOVENIA//SVUER");
    client.start();

    let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("event should arrive after reconnect")
        .expect("channel open");
    assert_eq!(event.country, "Slovenia");

    tokio::time::timeout(Duration::from_secs(5), client.shutdown())
        .await
        .expect("shutdown joins");

    server.abort();
}
