//! Integration tests for the WebSocket connection lifecycle.

use futures::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use crate::helpers::{self, TestApp, WAIT, WsClient};

async fn next_frame(ws: &mut WsClient) -> Message {
    timeout(WAIT, ws.next())
        .await
        .expect("Timed out waiting for a frame")
        .expect("Stream ended")
        .expect("WebSocket error")
}

async fn next_text(ws: &mut WsClient) -> String {
    match next_frame(ws).await {
        Message::Text(text) => text.as_str().to_owned(),
        other => panic!("Expected a text frame, got {other:?}"),
    }
}

/// Drain until the server closes the socket; returns whether a close frame came.
async fn wait_for_server_close(ws: &mut WsClient) -> bool {
    timeout(WAIT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) => return true,
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return false,
            }
        }
    })
    .await
    .expect("Server never closed the socket")
}

#[tokio::test]
async fn test_load_is_first_frame() {
    let app = TestApp::new().await;
    let addr = app.spawn().await;

    let mut ws = helpers::connect(addr).await;
    assert_eq!(next_text(&mut ws).await, "load");
    app.wait_for_active(1).await;
}

#[tokio::test]
async fn test_loopback_echo() {
    let app = TestApp::new().await;
    let addr = app.spawn().await;

    let mut ws = helpers::connect(addr).await;
    assert_eq!(next_text(&mut ws).await, "load");

    ws.send(Message::text("move 1 2 3")).await.unwrap();
    ws.send(Message::text("look 0 90")).await.unwrap();
    assert_eq!(next_text(&mut ws).await, "move 1 2 3");
    assert_eq!(next_text(&mut ws).await, "look 0 90");

    ws.send(Message::binary(vec![0xff, 0x01])).await.unwrap();
    match next_frame(&mut ws).await {
        Message::Binary(data) => assert_eq!(&data[..], &[0xff, 0x01]),
        other => panic!("Expected a binary frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connections_are_independent() {
    let app = TestApp::new().await;
    let addr = app.spawn().await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        let mut ws = helpers::connect(addr).await;
        assert_eq!(next_text(&mut ws).await, "load");
        clients.push(ws);
    }
    app.wait_for_active(3).await;

    for (i, ws) in clients.iter_mut().enumerate() {
        ws.send(Message::text(format!("client {i}"))).await.unwrap();
    }
    for (i, ws) in clients.iter_mut().enumerate() {
        assert_eq!(next_text(ws).await, format!("client {i}"));
    }

    let first = clients.remove(0);
    drop(first);
    app.wait_for_active(2).await;
}

#[tokio::test]
async fn test_oversized_message_closes_connection() {
    let app = TestApp::new().await;
    let addr = app.spawn().await;

    let mut ws = helpers::connect(addr).await;
    assert_eq!(next_text(&mut ws).await, "load");
    app.wait_for_active(1).await;

    ws.send(Message::binary(vec![b'x'; 600])).await.unwrap();
    wait_for_server_close(&mut ws).await;

    app.wait_for_active(0).await;
    assert_eq!(app.engine.metrics().snapshot().connections_active, 0);
}

#[tokio::test]
async fn test_client_close_unregisters_and_ends_session() {
    let app = TestApp::new().await;
    let addr = app.spawn().await;

    let mut ws = helpers::connect(addr).await;
    assert_eq!(next_text(&mut ws).await, "load");
    app.wait_for_active(1).await;

    ws.close(None).await.unwrap();
    app.wait_for_active(0).await;

    timeout(WAIT, async {
        while app.world.stats().sessions_stopped() < 1 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Session was never stopped");
    assert_eq!(app.world.stats().sessions_started(), 1);
}

#[tokio::test]
async fn test_engine_shutdown_sends_close_frames() {
    let app = TestApp::new().await;
    let addr = app.spawn().await;

    let mut a = helpers::connect(addr).await;
    let mut b = helpers::connect(addr).await;
    assert_eq!(next_text(&mut a).await, "load");
    assert_eq!(next_text(&mut b).await, "load");
    app.wait_for_active(2).await;

    app.engine.shutdown().await;

    assert!(wait_for_server_close(&mut a).await);
    assert!(wait_for_server_close(&mut b).await);
}

#[tokio::test]
async fn test_plain_get_is_not_upgraded() {
    let app = TestApp::new().await;

    let response = app.get("/ws").await;
    assert!(
        response.status.is_client_error(),
        "Expected a 4xx, got {}",
        response.status
    );
    app.wait_for_active(0).await;
    assert_eq!(app.world.stats().sessions_started(), 0);
}
