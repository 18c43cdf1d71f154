use serde::{Deserialize, Serialize};
use sqlbridge_core::value::{DynamicValue, ResultMap};
use uuid::Uuid;

/// Host connection details sent as the first line on stdin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnInfo {
    #[serde(rename = "nlPort")]
    pub port: u16,
    #[serde(rename = "nlToken")]
    pub token: String,
    #[serde(rename = "nlConnectToken", default)]
    pub connect_token: String,
    #[serde(rename = "nlExtensionId", default)]
    pub extension_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrontendMessage {
    Event { event: String, data: DynamicValue },
    /// A line that could not be decoded into an event.
    Malformed { reason: String },
    Terminate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendMessage {
    Result { event: String, result: ResultMap },
    Error { event: Option<String>, message: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEvent {
    pub event: String,
    #[serde(default)]
    pub data: DynamicValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireReply<'a> {
    pub id: Uuid,
    pub access_token: &'a str,
    pub event: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a ResultMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> WireReply<'a> {
    pub fn new(access_token: &'a str, msg: &'a BackendMessage) -> Self {
        let (event, result, error) = match msg {
            BackendMessage::Result { event, result } => (Some(event.as_str()), Some(result), None),
            BackendMessage::Error { event, message } => {
                (event.as_deref(), None, Some(message.as_str()))
            }
        };
        Self {
            id: Uuid::new_v4(),
            access_token,
            event,
            result,
            error,
        }
    }
}
