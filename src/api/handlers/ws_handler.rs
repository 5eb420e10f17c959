//! WebSocket endpoint for realtime order events.
//!
//! Each socket runs a writer task draining its registry queue and a reader
//! task feeding text frames to the hub. When the writer dies the reader is
//! asked to stop between frames instead of being aborted. Messages
//! authenticate themselves, so the upgrade itself is public.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::api::AppState;
use crate::realtime::{ConnectionId, RealtimeHub};

pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.realtime.clone();
    ws.on_upgrade(move |socket| serve_socket(hub, socket))
}

async fn serve_socket(hub: Arc<RealtimeHub>, socket: WebSocket) {
    let (connection, mut outbound) = hub.registry().register();
    let (mut sink, stream) = socket.split();
    tracing::info!(%connection, "Realtime client connected");

    let mut writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let (stop, stopped) = oneshot::channel();
    let mut reader = tokio::spawn(read_frames(hub.clone(), connection, stream, stopped));

    // The reader is never aborted: a message it is handling may be halfway
    // through an order mutation.
    tokio::select! {
        _ = &mut writer => {
            let _ = stop.send(());
            if let Err(e) = reader.await {
                tracing::warn!(%connection, error = %e, "Realtime reader ended abnormally");
            }
        }
        _ = &mut reader => writer.abort(),
    }

    hub.registry().remove(&connection);
    tracing::info!(%connection, "Realtime client disconnected");
}

/// Feed text frames to the hub until the stream ends, the peer closes, or
/// `stopped` fires. `stopped` is only observed between frames.
async fn read_frames<S>(
    hub: Arc<RealtimeHub>,
    connection: ConnectionId,
    mut stream: S,
    mut stopped: oneshot::Receiver<()>,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = &mut stopped => break,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => hub.handle_text(connection, &text).await,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(%connection, error = %e, "Realtime socket error");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewOrder, OrderResponse, UserRole};
    use crate::services::{
        AuthService, MockAuthService, MockOrderService, MockServiceContainer, OrderService,
    };
    use crate::test_utils::{test_order, test_user};
    use chrono::Utc;
    use futures::stream;
    use serde_json::{json, Value};
    use std::sync::mpsc as blocking;
    use std::time::Duration;
    use uuid::Uuid;

    fn new_order_frame() -> Message {
        Message::Text(
            json!({
                "type": "NEW_ORDER",
                "payload": {
                    "token": "valid",
                    "items": [{ "productId": Uuid::new_v4(), "quantity": 1, "unitPrice": 1.0 }]
                },
                "timestamp": 0
            })
            .to_string(),
        )
    }

    fn hub_with_orders(orders: MockOrderService) -> Arc<RealtimeHub> {
        let mut auth = MockAuthService::new();
        auth.expect_authenticate()
            .returning(|_| Ok(test_user(UserRole::Client)));
        let auth: Arc<dyn AuthService> = Arc::new(auth);
        let orders: Arc<dyn OrderService> = Arc::new(orders);

        let mut container = MockServiceContainer::new();
        container.expect_auth().returning(move || auth.clone());
        container.expect_orders().returning(move || orders.clone());
        Arc::new(RealtimeHub::new(Arc::new(container)))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_lets_in_flight_order_finish() {
        let (entered_tx, entered_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = blocking::channel::<()>();
        let mut entered_tx = Some(entered_tx);

        let mut orders = MockOrderService::new();
        orders.expect_create_order().times(1).returning(move |actor, _| {
            if let Some(tx) = entered_tx.take() {
                let _ = tx.send(());
            }
            release_rx.recv().unwrap();
            let now = Utc::now();
            Ok(OrderResponse::new(
                test_order(NewOrder {
                    id: Uuid::new_v4(),
                    client_id: actor.id,
                    order_date: now,
                    items: Vec::new(),
                    total_amount: 0.0,
                }),
                None,
            ))
        });

        let hub = hub_with_orders(orders);
        let (_, mut observer) = hub.registry().register();
        let (sender, _sender_rx) = hub.registry().register();

        let frames =
            stream::iter(vec![Ok::<_, axum::Error>(new_order_frame())]).chain(stream::pending());
        let (stop, stopped) = oneshot::channel();
        let reader = tokio::spawn(read_frames(hub.clone(), sender, frames, stopped));

        entered_rx.await.unwrap();
        stop.send(()).unwrap();
        release_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), reader)
            .await
            .unwrap()
            .unwrap();

        let event: Value = serde_json::from_str(&observer.try_recv().unwrap()).unwrap();
        assert_eq!(event["type"], "ORDER_CREATED");
    }

    #[tokio::test]
    async fn test_reader_ends_on_close_frame() {
        let hub = hub_with_orders(MockOrderService::new());
        let (connection, _rx) = hub.registry().register();

        let frames = stream::iter(vec![
            Ok::<_, axum::Error>(Message::Close(None)),
            Ok(new_order_frame()),
        ]);
        let (_stop, stopped) = oneshot::channel();

        tokio::time::timeout(
            Duration::from_secs(5),
            read_frames(hub, connection, frames, stopped),
        )
        .await
        .unwrap();
    }
}
