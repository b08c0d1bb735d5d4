//! Cubo cloud API payloads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Desired/observed device position. The API calls these "open" and "close".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCommand {
    Open,
    Close,
}

impl DeviceCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceCommand::Open => "open",
            DeviceCommand::Close => "close",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceCommand {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DeviceCommand::Open),
            "close" => Ok(DeviceCommand::Close),
            other => Err(ClientError::InvalidStatus(other.to_string())),
        }
    }
}

/// `deviceStatus` as reported by the cloud
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Open,
    Close,
    Unknown(String),
}

impl RemoteStatus {
    fn from_value(value: &Value) -> Self {
        match value.as_str() {
            Some("open") => RemoteStatus::Open,
            Some("close") => RemoteStatus::Close,
            Some(other) => RemoteStatus::Unknown(other.to_string()),
            None => RemoteStatus::Unknown(value.to_string()),
        }
    }

    pub fn matches(&self, command: DeviceCommand) -> bool {
        matches!(
            (self, command),
            (RemoteStatus::Open, DeviceCommand::Open) | (RemoteStatus::Close, DeviceCommand::Close)
        )
    }
}

/// Why a status body could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusReportError {
    NotAcknowledged,
    MissingDeviceStatus,
    MissingOnline,
}

impl fmt::Display for StatusReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusReportError::NotAcknowledged => f.write_str("response not acknowledged"),
            StatusReportError::MissingDeviceStatus => f.write_str("missing deviceStatus"),
            StatusReportError::MissingOnline => f.write_str("missing online"),
        }
    }
}

/// True when the body carries `"status": true`
pub fn is_acknowledged(body: &Value) -> bool {
    body.get("status").and_then(Value::as_bool) == Some(true)
}

/// Parsed `GET /api/device/{id}/status/` body
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatusReport {
    pub device_status: RemoteStatus,
    pub online: bool,
}

impl DeviceStatusReport {
    pub fn from_body(body: &Value) -> Result<Self, StatusReportError> {
        if !is_acknowledged(body) {
            return Err(StatusReportError::NotAcknowledged);
        }

        let device_status = body
            .get("deviceStatus")
            .map(RemoteStatus::from_value)
            .ok_or(StatusReportError::MissingDeviceStatus)?;

        // online is 0|1 on the wire; accept a bool too
        let online = match body.get("online") {
            Some(Value::Bool(b)) => *b,
            Some(v) => v.as_i64() == Some(1),
            None => return Err(StatusReportError::MissingOnline),
        };

        Ok(Self {
            device_status,
            online,
        })
    }
}

/// Device ids from a `GET /api/device/` body, or None if `devices` is missing.
/// Entries without a positive integer id are skipped.
pub fn device_ids(body: &Value) -> Option<Vec<i64>> {
    let devices = body.get("devices")?.as_array()?;

    let ids = devices
        .iter()
        .filter_map(|dev| {
            let id = dev.get("id").and_then(Value::as_i64).filter(|id| *id > 0);
            if id.is_none() {
                tracing::warn!("[CuboClient] Skipping device without a valid id: {}", dev);
            }
            id
        })
        .collect();

    Some(ids)
}
