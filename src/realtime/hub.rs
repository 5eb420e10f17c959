//! Message dispatch for the realtime channel.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::protocol::{
    ClientMessage, GetOrdersPayload, NewOrderPayload, ServerMessage, UpdateStatusPayload,
    CODE_INVALID_MESSAGE, GET_ORDERS, NEW_ORDER, UPDATE_ORDER_STATUS,
};
use super::registry::{ConnectionId, ConnectionRegistry};
use crate::domain::{OrderResponse, StatusChange, User};
use crate::errors::{AppError, AppResult};
use crate::services::{PlaceOrder, ServiceContainer};
use crate::types::DateRange;

/// Where the result of a handled message goes.
enum Reply {
    Sender(ServerMessage),
    Everyone(ServerMessage),
}

/// Owns the connection registry and routes inbound messages to services.
pub struct RealtimeHub {
    registry: ConnectionRegistry,
    services: Arc<dyn ServiceContainer>,
}

fn parse_payload<T: DeserializeOwned>(kind: &str, payload: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| AppError::bad_request(format!("Invalid {kind} payload: {e}")))
}

impl RealtimeHub {
    pub fn new(services: Arc<dyn ServiceContainer>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            services,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn order_created(&self, order: &OrderResponse) {
        let reached = self
            .registry
            .broadcast(&ServerMessage::order_created(order.clone()));
        tracing::debug!(order_id = %order.id, reached, "Broadcast order created");
    }

    pub fn order_status_changed(&self, order: &OrderResponse) {
        let reached = self
            .registry
            .broadcast(&ServerMessage::order_status_changed(order.clone()));
        tracing::debug!(order_id = %order.id, status = %order.status, reached, "Broadcast order status");
    }

    /// Handle one text frame received on `connection`.
    pub async fn handle_text(&self, connection: ConnectionId, text: &str) {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(%connection, error = %e, "Malformed realtime frame");
                self.registry.send_to(
                    &connection,
                    &ServerMessage::error(CODE_INVALID_MESSAGE, "Malformed message", 400),
                );
                return;
            }
        };

        let kind = message.kind.clone();
        match self.dispatch(message).await {
            Ok(Reply::Sender(reply)) => {
                self.registry.send_to(&connection, &reply);
            }
            Ok(Reply::Everyone(event)) => {
                self.registry.broadcast(&event);
            }
            Err(e) => {
                if e.status().is_server_error() {
                    tracing::error!(%connection, kind = %kind, error = %e, "Realtime handler failed");
                } else {
                    tracing::debug!(%connection, kind = %kind, error = %e, "Realtime request rejected");
                }
                self.registry.send_to(&connection, &ServerMessage::from(&e));
            }
        }
    }

    async fn dispatch(&self, message: ClientMessage) -> AppResult<Reply> {
        match message.kind.as_str() {
            NEW_ORDER => {
                let payload: NewOrderPayload = parse_payload(NEW_ORDER, message.payload)?;
                let actor = self.authenticate(&payload.token).await?;
                let order = self
                    .services
                    .orders()
                    .create_order(
                        &actor,
                        PlaceOrder {
                            client_id: payload.client_id,
                            items: payload.items,
                        },
                    )
                    .await?;
                Ok(Reply::Everyone(ServerMessage::order_created(order)))
            }
            UPDATE_ORDER_STATUS => {
                let payload: UpdateStatusPayload =
                    parse_payload(UPDATE_ORDER_STATUS, message.payload)?;
                let actor = self.authenticate(&payload.token).await?;
                let change = StatusChange {
                    status: payload.status,
                    delivery_agent: payload.delivery_agent,
                    delivery_date: payload.delivery_date,
                };
                let order = self
                    .services
                    .orders()
                    .update_status(&actor, payload.order_id, change)
                    .await?;
                Ok(Reply::Everyone(ServerMessage::order_status_changed(order)))
            }
            GET_ORDERS => {
                let payload: GetOrdersPayload = parse_payload(GET_ORDERS, message.payload)?;
                let viewer = self.authenticate(&payload.token).await?;
                let orders = self
                    .services
                    .orders()
                    .list_orders(&viewer, DateRange::new(payload.from, payload.to))
                    .await?;
                Ok(Reply::Sender(ServerMessage::orders(orders)))
            }
            other => Ok(Reply::Sender(ServerMessage::unknown_type(other))),
        }
    }

    async fn authenticate(&self, token: &str) -> AppResult<User> {
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }
        self.services.auth().authenticate(token).await
    }
}
