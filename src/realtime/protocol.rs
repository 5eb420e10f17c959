//! Wire format of the realtime channel.
//!
//! Clients send `{ "type", "payload", "timestamp" }` envelopes; the server
//! answers with the same envelope shape, or with a flat error object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{NewOrderItem, OrderResponse, OrderStatus};
use crate::errors::AppError;

pub const NEW_ORDER: &str = "NEW_ORDER";
pub const UPDATE_ORDER_STATUS: &str = "UPDATE_ORDER_STATUS";
pub const GET_ORDERS: &str = "GET_ORDERS";

pub const CODE_UNKNOWN_MESSAGE_TYPE: &str = "UNKNOWN_MESSAGE_TYPE";
pub const CODE_INVALID_MESSAGE: &str = "INVALID_MESSAGE";

/// Inbound envelope. The payload stays untyped until the tag is known.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderPayload {
    pub token: String,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub token: String,
    pub order_id: Uuid,
    pub status: OrderStatus,
    #[serde(default)]
    pub delivery_agent: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetOrdersPayload {
    pub token: String,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub order: OrderResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderList {
    pub orders: Vec<OrderResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    OrderCreated {
        payload: OrderEvent,
        timestamp: i64,
    },
    OrderStatusChanged {
        payload: OrderEvent,
        timestamp: i64,
    },
    GetOrdersResponse {
        payload: OrderList,
        timestamp: i64,
    },
    Error {
        code: String,
        message: String,
        #[serde(rename = "statusCode")]
        status_code: u16,
        timestamp: i64,
    },
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ServerMessage {
    pub fn order_created(order: OrderResponse) -> Self {
        Self::OrderCreated {
            payload: OrderEvent { order },
            timestamp: now_millis(),
        }
    }

    pub fn order_status_changed(order: OrderResponse) -> Self {
        Self::OrderStatusChanged {
            payload: OrderEvent { order },
            timestamp: now_millis(),
        }
    }

    pub fn orders(orders: Vec<OrderResponse>) -> Self {
        Self::GetOrdersResponse {
            payload: OrderList { orders },
            timestamp: now_millis(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
            status_code,
            timestamp: now_millis(),
        }
    }

    pub fn unknown_type(kind: &str) -> Self {
        Self::error(
            CODE_UNKNOWN_MESSAGE_TYPE,
            format!("Unknown message type: {kind}"),
            400,
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl From<&AppError> for ServerMessage {
    fn from(err: &AppError) -> Self {
        Self::error(err.code(), err.user_message(), err.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_shape() {
        let value = serde_json::to_value(ServerMessage::unknown_type("PING")).unwrap();

        assert_eq!(value["type"], "ERROR");
        assert_eq!(value["code"], "UNKNOWN_MESSAGE_TYPE");
        assert_eq!(value["message"], "Unknown message type: PING");
        assert_eq!(value["statusCode"], 400);
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn test_response_tag_names() {
        let value = serde_json::to_value(ServerMessage::orders(Vec::new())).unwrap();
        assert_eq!(value["type"], "GET_ORDERS_RESPONSE");
        assert_eq!(value["payload"]["orders"], json!([]));
    }

    #[test]
    fn test_client_message_payload_is_optional() {
        let message: ClientMessage = serde_json::from_str(r#"{"type":"GET_ORDERS"}"#).unwrap();
        assert_eq!(message.kind, GET_ORDERS);
        assert!(message.payload.is_null());
        assert!(message.timestamp.is_none());
    }

    #[test]
    fn test_update_status_accepts_transit_alias() {
        let payload: UpdateStatusPayload = serde_json::from_value(json!({
            "token": "t",
            "orderId": Uuid::nil(),
            "status": "transit"
        }))
        .unwrap();
        assert_eq!(payload.status, OrderStatus::InTransit);
    }
}
