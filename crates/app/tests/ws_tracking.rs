//! Order tracking against a local WebSocket server.

use std::{sync::Arc, time::Duration};

use futures::{SinkExt as _, StreamExt as _};
use sacola::{ids::OrderId, orders::OrderStatus};
use sacola_app::domain::{
    orders::{MockOrdersApi, OrderStatusRecord},
    tracking::{ConnectionState, OrderStatusSubscriber, ReconnectPolicy, WsStatusChannel},
};
use testresult::TestResult;
use tokio::{net::TcpListener, time::timeout};
use tokio_tungstenite::{accept_async, tungstenite};

const WAIT: Duration = Duration::from_secs(5);

fn pending_orders() -> MockOrdersApi {
    let mut orders = MockOrdersApi::new();
    orders.expect_fetch_status().returning(|_| {
        Ok(OrderStatusRecord {
            status: Some("PENDENTE".to_string()),
            delivery_code: None,
        })
    });

    orders
}

fn subscriber(ws_url: &str) -> OrderStatusSubscriber {
    OrderStatusSubscriber::new(
        Arc::new(pending_orders()),
        Arc::new(WsStatusChannel::new(ws_url)),
        ReconnectPolicy::disabled(),
    )
}

#[tokio::test]
async fn follows_live_updates_and_sends_close_frame() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await?;
        let mut socket = accept_async(stream).await?;

        for message in [
            r#"{"status": "CONFIRMADO"}"#,
            r#"{"mensagem": "Pedido em preparo"}"#,
            r#"{"status": "SAIU_PARA_ENTREGA", "delivery_code": "X7K2"}"#,
        ] {
            socket.send(tungstenite::Message::text(message)).await?;
        }

        while let Some(message) = socket.next().await {
            if matches!(message?, tungstenite::Message::Close(_)) {
                return Ok(true);
            }
        }

        Ok::<_, tungstenite::Error>(false)
    });

    let mut subscription = subscriber(&format!("ws://{addr}/ws/order")).attach(OrderId::new(42));

    timeout(WAIT, async {
        while subscription.snapshot().delivery_code().is_none() {
            if subscription.changed().await.is_none() {
                break;
            }
        }
    })
    .await?;

    let snapshot = subscription.snapshot();
    assert_eq!(snapshot.status(), Some(OrderStatus::OutForDelivery));
    assert_eq!(snapshot.delivery_code(), Some("X7K2"));
    assert_eq!(snapshot.connection, ConnectionState::Connected);

    timeout(WAIT, subscription.close()).await?;

    let saw_close = timeout(WAIT, server).await???;
    assert!(saw_close, "server should receive a close frame");

    Ok(())
}

#[tokio::test]
async fn refused_connection_keeps_snapshot_status() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let mut subscription = subscriber(&format!("ws://{addr}/ws/order")).attach(OrderId::new(7));

    timeout(WAIT, async { while subscription.changed().await.is_some() {} }).await?;

    let snapshot = subscription.snapshot();
    assert_eq!(snapshot.connection, ConnectionState::Disconnected);
    assert!(snapshot.last_error.is_some(), "connect error should be kept");
    assert_eq!(snapshot.status(), Some(OrderStatus::Pending));

    Ok(())
}
