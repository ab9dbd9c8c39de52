// --- File: crates/dialbook_voice/src/service.rs ---
//! HTTP client for the voice platform, plus the `VoiceService`
//! implementation the gateway consumes.

use dialbook_common::services::{
    BoxFuture, CallRecord, OutboundCallRequest, ServiceError, VoiceService,
};
use dialbook_common::HTTP_CLIENT;
use dialbook_config::VoiceConfig;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::VoiceError;

#[derive(Deserialize, Debug)]
struct CallApiResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize, Debug)]
struct VoiceApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the voice platform's REST API.
#[derive(Clone)]
pub struct VoiceClient {
    http: Client,
    base_url: String,
    api_key: String,
    assistant_id: Option<String>,
    phone_number_id: Option<String>,
    sip_trunk_id: Option<String>,
}

impl VoiceClient {
    pub fn new(config: &VoiceConfig, api_key: String) -> Self {
        VoiceClient {
            http: HTTP_CLIENT.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            assistant_id: config.assistant_id.clone(),
            phone_number_id: config.phone_number_id.clone(),
            sip_trunk_id: config.sip_trunk_id.clone(),
        }
    }

    async fn read_api_error(response: Response) -> VoiceError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<VoiceApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or(text);
        VoiceError::ApiError {
            status_code: status,
            message,
        }
    }

    fn assistant_for(&self, request: &OutboundCallRequest) -> Result<String, VoiceError> {
        request
            .assistant_id
            .clone()
            .or_else(|| self.assistant_id.clone())
            .ok_or_else(|| VoiceError::ConfigError("no assistant id configured or supplied".into()))
    }

    async fn post_call(&self, payload: serde_json::Value) -> Result<CallRecord, VoiceError> {
        let url = format!("{}/call", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }
        let call: CallApiResponse = response.json().await?;
        Ok(CallRecord {
            id: call.id,
            status: call.status.unwrap_or_else(|| "queued".to_string()),
            transport: payload
                .get("sipTrunkId")
                .map(|_| "sip".to_string())
                .or(Some("pstn".to_string())),
        })
    }

    /// Place a plain outbound call over the platform's phone number.
    pub async fn place_call(
        &self,
        request: &OutboundCallRequest,
    ) -> Result<CallRecord, VoiceError> {
        let assistant_id = self.assistant_for(request)?;
        let phone_number_id = self.phone_number_id.clone().ok_or_else(|| {
            VoiceError::ConfigError("no phone number id configured".into())
        })?;

        info!("Placing outbound call to {}", request.phone_number);
        let payload = json!({
            "assistantId": assistant_id,
            "phoneNumberId": phone_number_id,
            "customer": { "number": request.phone_number },
            "metadata": request.metadata.clone().unwrap_or_else(|| json!({})),
        });
        self.post_call(payload).await
    }

    /// Place an outbound call through the configured SIP trunk.
    pub async fn place_sip_call(
        &self,
        request: &OutboundCallRequest,
    ) -> Result<CallRecord, VoiceError> {
        let assistant_id = self.assistant_for(request)?;
        let sip_trunk_id = self
            .sip_trunk_id
            .clone()
            .ok_or_else(|| VoiceError::ConfigError("no SIP trunk configured".into()))?;

        info!("Placing SIP outbound call to {}", request.phone_number);
        let payload = json!({
            "assistantId": assistant_id,
            "sipTrunkId": sip_trunk_id,
            "customer": { "number": request.phone_number },
            "metadata": request.metadata.clone().unwrap_or_else(|| json!({})),
        });
        self.post_call(payload).await
    }

    /// Push a message or function response into an active call.
    pub async fn post_message(
        &self,
        call_id: &str,
        payload: serde_json::Value,
    ) -> Result<(), VoiceError> {
        let url = format!("{}/call/{}/message", self.base_url, call_id);
        debug!("Sending message to call {}", call_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }
        Ok(())
    }

    pub async fn fetch_call(&self, call_id: &str) -> Result<CallRecord, VoiceError> {
        let url = format!("{}/call/{}", self.base_url, call_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }
        let call: CallApiResponse = response.json().await?;
        Ok(CallRecord {
            id: call.id,
            status: call.status.unwrap_or_else(|| "unknown".to_string()),
            transport: None,
        })
    }

    pub async fn hangup_call(&self, call_id: &str) -> Result<(), VoiceError> {
        let url = format!("{}/call/{}", self.base_url, call_id);
        info!("Hanging up call {}", call_id);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }
        Ok(())
    }
}

impl VoiceService for VoiceClient {
    fn create_call(&self, request: OutboundCallRequest) -> BoxFuture<'_, CallRecord, ServiceError> {
        Box::pin(async move { self.place_call(&request).await.map_err(Into::into) })
    }

    fn create_sip_call(
        &self,
        request: OutboundCallRequest,
    ) -> BoxFuture<'_, CallRecord, ServiceError> {
        Box::pin(async move { self.place_sip_call(&request).await.map_err(Into::into) })
    }

    fn send_message(
        &self,
        call_id: &str,
        payload: serde_json::Value,
    ) -> BoxFuture<'_, (), ServiceError> {
        let call_id = call_id.to_string();
        Box::pin(async move { self.post_message(&call_id, payload).await.map_err(Into::into) })
    }

    fn get_call(&self, call_id: &str) -> BoxFuture<'_, CallRecord, ServiceError> {
        let call_id = call_id.to_string();
        Box::pin(async move { self.fetch_call(&call_id).await.map_err(Into::into) })
    }

    fn end_call(&self, call_id: &str) -> BoxFuture<'_, (), ServiceError> {
        let call_id = call_id.to_string();
        Box::pin(async move { self.hangup_call(&call_id).await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialbook_config::VoiceConfig;

    fn test_client(sip: bool) -> VoiceClient {
        VoiceClient::new(
            &VoiceConfig {
                base_url: "https://voice.test".into(),
                assistant_id: Some("asst_1".into()),
                phone_number_id: Some("pn_1".into()),
                sip_trunk_id: if sip { Some("sip_1".into()) } else { None },
            },
            "key".into(),
        )
    }

    #[tokio::test]
    async fn sip_call_without_trunk_is_a_config_error() {
        let client = test_client(false);
        let request = OutboundCallRequest {
            phone_number: "+41790000000".into(),
            assistant_id: None,
            metadata: None,
        };
        let err = client.place_sip_call(&request).await.unwrap_err();
        assert!(err.to_string().contains("SIP trunk"));
    }

    #[tokio::test]
    async fn call_control_transport_failures_classify_as_upstream() {
        use dialbook_common::services::{ServiceErrorKind, VoiceService};

        // Unroutable endpoint: every call-control operation must surface a
        // transport failure as an upstream service error, not a panic.
        let client = VoiceClient::new(
            &VoiceConfig {
                base_url: "http://127.0.0.1:1".into(),
                assistant_id: Some("asst_1".into()),
                phone_number_id: Some("pn_1".into()),
                sip_trunk_id: None,
            },
            "key".into(),
        );

        let err = client
            .send_message("call-1", serde_json::json!({"type": "say"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Upstream);
        assert_eq!(err.status, None);

        let err = client.get_call("call-1").await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Upstream);

        let err = client.end_call("call-1").await.unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::Upstream);
    }

    #[test]
    fn request_assistant_overrides_configured_default() {
        let client = test_client(true);
        let request = OutboundCallRequest {
            phone_number: "+41790000000".into(),
            assistant_id: Some("asst_override".into()),
            metadata: None,
        };
        assert_eq!(client.assistant_for(&request).unwrap(), "asst_override");
    }
}
