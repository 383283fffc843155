//! HTTP webhook sender.
//!
//! Delivers outbound text by POSTing `{to, text}` to the chat gateway's
//! `/messages` endpoint. The gateway owns the actual messaging session.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use parley_core::transport::{OutboundSender, TransportError};
use parley_types::config::TransportConfig;
use parley_types::conversation::OutboundTarget;

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    to: &'a str,
    text: &'a str,
}

/// Gateway-backed implementation of [`OutboundSender`].
pub struct WebhookSender {
    client: reqwest::Client,
    endpoint: String,
    token: Option<SecretString>,
}

impl WebhookSender {
    /// Build a sender. When `token` is set it is sent as `X-Gateway-Token`.
    pub fn new(config: &TransportConfig, token: Option<SecretString>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.send_timeout())
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/messages", config.gateway_url.trim_end_matches('/')),
            token,
        })
    }
}

impl OutboundSender for WebhookSender {
    async fn send_text(&self, target: &OutboundTarget, text: &str) -> Result<(), TransportError> {
        let mut request = self.client.post(&self.endpoint).json(&OutboundMessage {
            to: &target.0,
            text,
        });
        if let Some(ref token) = self.token {
            request = request.header("X-Gateway-Token", token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(to = %target, "message delivered to gateway");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    type Received = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn record(
        State(received): State<Received>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let token = headers
            .get("x-gateway-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        received.lock().unwrap().push((token, body));
        StatusCode::ACCEPTED
    }

    async fn spawn_gateway(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn config(gateway_url: String) -> TransportConfig {
        TransportConfig {
            gateway_url,
            send_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn posts_target_and_text_with_token() {
        let received: Received = Arc::default();
        let router = Router::new()
            .route("/messages", post(record))
            .with_state(Arc::clone(&received));
        let url = spawn_gateway(router).await;

        let sender = WebhookSender::new(&config(url), Some(SecretString::from("gw-secret"))).unwrap();
        let target = OutboundTarget("628123456789@s.whatsapp.net".to_string());
        sender.send_text(&target, "hello").await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0.as_deref(), Some("gw-secret"));
        assert_eq!(received[0].1["to"], "628123456789@s.whatsapp.net");
        assert_eq!(received[0].1["text"], "hello");
    }

    #[tokio::test]
    async fn gateway_rejection_is_an_error() {
        let router = Router::new().route(
            "/messages",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "not logged in") }),
        );
        let sender = WebhookSender::new(&config(spawn_gateway(router).await), None).unwrap();

        let err = sender
            .send_text(&OutboundTarget("x".to_string()), "hi")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Rejected { status: 503, ref message } if message == "not logged in"
        ));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_request_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sender = WebhookSender::new(&config(format!("http://{addr}")), None).unwrap();
        assert!(matches!(
            sender.send_text(&OutboundTarget("x".to_string()), "hi").await,
            Err(TransportError::Request(_))
        ));
    }
}
