//! FCM HTTP v1 推送网关
//!
//! HTTP v1 接口没有批量发送，多播在网关内按令牌并发发送，
//! 对调用方仍然是一次调用、按令牌顺序返回结果。

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chat_push_core::config::PushGatewayConfig;
use chat_push_core::error::{ErrorBuilder, ErrorCode, InfraResultExt, Result};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::GatewayError;
use crate::domain::model::{DeliveryErrorKind, MessagePriority, NotificationPayload, SendResponse};
use crate::domain::repository::PushGateway;

const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com/v1";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// 同时在途的请求数
const MAX_IN_FLIGHT: usize = 16;
/// 单个令牌与发送方不匹配，不属于凭据问题
const SENDER_ID_MISMATCH: &str = "SENDER_ID_MISMATCH";

#[derive(Serialize)]
struct SendRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
    data: BTreeMap<&'static str, &'a str>,
    android: AndroidConfig<'a>,
    apns: ApnsConfig<'a>,
}

#[derive(Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
struct AndroidConfig<'a> {
    priority: &'static str,
    notification: AndroidNotification<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AndroidNotification<'a> {
    channel_id: &'a str,
    click_action: &'a str,
    sound: &'a str,
}

#[derive(Serialize)]
struct ApnsConfig<'a> {
    payload: ApnsPayload<'a>,
}

#[derive(Serialize)]
struct ApnsPayload<'a> {
    aps: Aps<'a>,
}

#[derive(Serialize)]
struct Aps<'a> {
    sound: &'a str,
    category: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    error_code: Option<String>,
}

pub struct FcmPushGateway {
    client: Client,
    send_url: String,
    access_token: String,
}

impl FcmPushGateway {
    pub fn from_config(config: &PushGatewayConfig) -> Result<Self> {
        let project_id = required(config.project_id.as_deref(), "fcm gateway requires project_id")?;
        let access_token =
            required(config.access_token.as_deref(), "fcm gateway requires access_token")?;
        let endpoint = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT)
            .trim_end_matches('/');
        let timeout = Duration::from_millis(config.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));

        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .into_notify(ErrorCode::ConfigurationError, "failed to build http client")?;

        Ok(Self {
            client,
            send_url: format!("{endpoint}/projects/{project_id}/messages:send"),
            access_token: access_token.to_string(),
        })
    }

    async fn send_one(
        &self,
        token: &str,
        payload: &NotificationPayload,
    ) -> std::result::Result<SendResponse, GatewayError> {
        let request = SendRequest {
            message: build_message(token, payload),
        };
        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(SendResponse::ok());
        }

        let body = response.text().await.unwrap_or_default();
        let error = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error)
            .unwrap_or_default();
        let error_code = error.details.iter().find_map(|d| d.error_code.clone());
        let message = if error.message.is_empty() {
            format!("http status {}", status.as_u16())
        } else {
            error.message
        };
        if is_credential_rejection(status.as_u16(), error_code.as_deref()) {
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let kind = classify_error(status.as_u16(), &error.status, error_code.as_deref());
        Ok(SendResponse::failed(kind, message))
    }
}

#[async_trait]
impl PushGateway for FcmPushGateway {
    fn name(&self) -> &str {
        "fcm"
    }

    #[instrument(skip(self, tokens, payload), fields(tokens = tokens.len()))]
    async fn send_multicast(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Result<Vec<SendResponse>> {
        let requests: Vec<_> = tokens
            .iter()
            .map(|token| self.send_one(token, payload))
            .collect();
        let results: Vec<_> = stream::iter(requests)
            .buffered(MAX_IN_FLIGHT)
            .collect()
            .await;

        // 凭据被拒绝时整个多播失败
        let rejection = results.iter().find_map(|result| match result {
            Err(err @ GatewayError::Rejected { .. }) => Some(err.to_string()),
            _ => None,
        });
        if let Some(rejected) = rejection {
            return Err(
                ErrorBuilder::new(ErrorCode::ServiceUnavailable, "fcm rejected credentials")
                    .details(rejected)
                    .build_error(),
            );
        }

        if !results.is_empty() && results.iter().all(|result| result.is_err()) {
            let first = results
                .into_iter()
                .find_map(|result| result.err())
                .map(|err| err.to_string())
                .unwrap_or_default();
            return Err(GatewayError::AllRequestsFailed(first))
                .into_notify(ErrorCode::ServiceUnavailable, "fcm multicast failed");
        }

        let responses: Vec<SendResponse> = results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|err| {
                    warn!(error = %err, "fcm request failed at transport level");
                    SendResponse::failed(DeliveryErrorKind::Unavailable, err.to_string())
                })
            })
            .collect();
        debug!(
            success = responses.iter().filter(|r| r.success).count(),
            "fcm multicast completed"
        );
        Ok(responses)
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ErrorBuilder::new(ErrorCode::ConfigurationError, message).build_error())
}

fn build_message<'a>(token: &'a str, payload: &'a NotificationPayload) -> FcmMessage<'a> {
    let mut data = BTreeMap::new();
    data.insert("chatId", payload.metadata.chat_id.as_str());
    data.insert("messageId", payload.metadata.message_id.as_str());
    data.insert("senderId", payload.metadata.sender_id.as_str());

    let hints = &payload.hints;
    FcmMessage {
        token,
        notification: FcmNotification {
            title: &payload.title,
            body: &payload.body,
        },
        data,
        android: AndroidConfig {
            priority: match hints.priority {
                MessagePriority::High => "HIGH",
                MessagePriority::Normal => "NORMAL",
            },
            notification: AndroidNotification {
                channel_id: &hints.channel_id,
                click_action: &hints.click_action,
                sound: &hints.sound,
            },
        },
        apns: ApnsConfig {
            payload: ApnsPayload {
                aps: Aps {
                    sound: &hints.sound,
                    category: &hints.click_action,
                },
            },
        },
    }
}

/// 401，或不是单令牌发送方不匹配的 403
fn is_credential_rejection(http_status: u16, error_code: Option<&str>) -> bool {
    match http_status {
        401 => true,
        403 => error_code != Some(SENDER_ID_MISMATCH),
        _ => false,
    }
}

/// FCM 错误 -> 投递失败类型
pub fn classify_error(
    http_status: u16,
    status: &str,
    error_code: Option<&str>,
) -> DeliveryErrorKind {
    match error_code.unwrap_or(status) {
        "UNREGISTERED" | "NOT_FOUND" => DeliveryErrorKind::TokenNotRegistered,
        "INVALID_ARGUMENT" => DeliveryErrorKind::InvalidArgument,
        "QUOTA_EXCEEDED" | "RESOURCE_EXHAUSTED" => DeliveryErrorKind::QuotaExceeded,
        "UNAVAILABLE" | "INTERNAL" => DeliveryErrorKind::Unavailable,
        _ if http_status == 404 => DeliveryErrorKind::TokenNotRegistered,
        _ if http_status == 429 => DeliveryErrorKind::QuotaExceeded,
        _ if http_status >= 500 => DeliveryErrorKind::Unavailable,
        _ => DeliveryErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::model::ContentKind;
    use crate::domain::service::{Dispatcher, build_payload};
    use crate::infrastructure::http_stub::HttpStub;

    fn gateway_for(base_url: &str) -> FcmPushGateway {
        FcmPushGateway::from_config(&PushGatewayConfig {
            provider: "fcm".to_string(),
            project_id: Some("demo".to_string()),
            access_token: Some("ya29.token".to_string()),
            endpoint: Some(format!("{base_url}/v1")),
            timeout_ms: Some(2_000),
            ..Default::default()
        })
        .unwrap()
    }

    fn sample_payload() -> NotificationPayload {
        build_payload(
            "hola".to_string(),
            Some("Ana"),
            ContentKind::Text,
            "chat-1",
            "msg-1",
            "ana",
        )
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_message_shape() {
        let payload = build_payload(
            "hola".to_string(),
            Some("Ana"),
            ContentKind::Text,
            "chat-1",
            "msg-1",
            "ana",
        );
        let json = serde_json::to_value(SendRequest {
            message: build_message("tok-1", &payload),
        })
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "message": {
                    "token": "tok-1",
                    "notification": { "title": "Message from Ana", "body": "hola" },
                    "data": { "chatId": "chat-1", "messageId": "msg-1", "senderId": "ana" },
                    "android": {
                        "priority": "HIGH",
                        "notification": {
                            "channelId": "chat_messages",
                            "clickAction": "OPEN_CHAT_ACTIVITY",
                            "sound": "default"
                        }
                    },
                    "apns": {
                        "payload": { "aps": { "sound": "default", "category": "OPEN_CHAT_ACTIVITY" } }
                    }
                }
            })
        );
    }

    #[test]
    fn test_classify_error() {
        assert_eq!(
            classify_error(404, "NOT_FOUND", Some("UNREGISTERED")),
            DeliveryErrorKind::TokenNotRegistered
        );
        assert_eq!(
            classify_error(404, "NOT_FOUND", None),
            DeliveryErrorKind::TokenNotRegistered
        );
        assert_eq!(
            classify_error(400, "INVALID_ARGUMENT", Some("INVALID_ARGUMENT")),
            DeliveryErrorKind::InvalidArgument
        );
        assert_eq!(
            classify_error(429, "RESOURCE_EXHAUSTED", Some("QUOTA_EXCEEDED")),
            DeliveryErrorKind::QuotaExceeded
        );
        assert_eq!(classify_error(503, "", None), DeliveryErrorKind::Unavailable);
        assert_eq!(
            classify_error(403, "PERMISSION_DENIED", Some("SENDER_ID_MISMATCH")),
            DeliveryErrorKind::Other
        );
    }

    #[test]
    fn test_error_envelope_parsing() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND","details":[{"@type":"type.googleapis.com/google.firebase.fcm.v1.FcmError","errorCode":"UNREGISTERED"}]}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.status, "NOT_FOUND");
        assert_eq!(
            envelope.error.details[0].error_code.as_deref(),
            Some("UNREGISTERED")
        );
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let config = PushGatewayConfig {
            provider: "fcm".to_string(),
            project_id: Some("demo".to_string()),
            ..Default::default()
        };
        let err = FcmPushGateway::from_config(&config).err().unwrap();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }

    #[test]
    fn test_from_config_builds_send_url() {
        let config = PushGatewayConfig {
            provider: "fcm".to_string(),
            project_id: Some("demo".to_string()),
            access_token: Some("ya29.token".to_string()),
            endpoint: Some("http://localhost:9099/v1/".to_string()),
            ..Default::default()
        };
        let gateway = FcmPushGateway::from_config(&config).unwrap();
        assert_eq!(gateway.send_url, "http://localhost:9099/v1/projects/demo/messages:send");
    }

    #[tokio::test]
    async fn test_unregistered_token_maps_to_token_not_registered() {
        let stub = HttpStub::start(|request| {
            if request.body.contains("dead-token") {
                (
                    404,
                    r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND","details":[{"errorCode":"UNREGISTERED"}]}}"#
                        .to_string(),
                )
            } else {
                (200, r#"{"name":"projects/demo/messages/1"}"#.to_string())
            }
        })
        .await;
        let gateway = gateway_for(&stub.base_url);

        let responses = gateway
            .send_multicast(&tokens(&["live-token", "dead-token"]), &sample_payload())
            .await
            .unwrap();

        assert_eq!(responses.len(), 2);
        assert!(responses[0].success);
        assert!(!responses[1].success);
        assert_eq!(
            responses[1].error_kind,
            Some(DeliveryErrorKind::TokenNotRegistered)
        );

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.method, "POST");
            assert_eq!(request.target, "/v1/projects/demo/messages:send");
            assert_eq!(request.header("authorization"), Some("Bearer ya29.token"));
            assert_eq!(request.json()["message"]["data"]["chatId"], "chat-1");
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_multicast_fails_dispatch() {
        let stub = HttpStub::start(|_| {
            (
                401,
                r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#
                    .to_string(),
            )
        })
        .await;
        let dispatcher = Dispatcher::new(Arc::new(gateway_for(&stub.base_url)));

        let err = dispatcher
            .dispatch(&sample_payload(), &tokens(&["t1", "t2"]))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DispatchFailed);
    }

    #[tokio::test]
    async fn test_permission_denied_fails_multicast_but_sender_mismatch_is_per_token() {
        let stub = HttpStub::start(|request| {
            let code = if request.body.contains("foreign-token") {
                "SENDER_ID_MISMATCH"
            } else {
                "THIRD_PARTY_AUTH_ERROR"
            };
            (
                403,
                format!(
                    r#"{{"error":{{"code":403,"status":"PERMISSION_DENIED","details":[{{"errorCode":"{code}"}}]}}}}"#
                ),
            )
        })
        .await;
        let gateway = gateway_for(&stub.base_url);

        let responses = gateway
            .send_multicast(&tokens(&["foreign-token"]), &sample_payload())
            .await
            .unwrap();
        assert_eq!(responses[0].error_kind, Some(DeliveryErrorKind::Other));

        let err = gateway
            .send_multicast(&tokens(&["foreign-token", "t2"]), &sample_payload())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_all_requests_failing_at_transport_is_an_error() {
        let gateway = gateway_for(&HttpStub::unreachable_url().await);

        let err = gateway
            .send_multicast(&tokens(&["t1", "t2"]), &sample_payload())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ServiceUnavailable);
    }
}
