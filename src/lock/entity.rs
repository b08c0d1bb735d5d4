//! Lock entity: one Cubo device presented as a lock

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::IntegrationInfo;
use crate::cubo::{CuboClient, DeviceCommand, DeviceStatusReport, RemoteStatus, Transport};

/// What the host platform can do with a lock: identify it, read it, command it
#[async_trait]
pub trait LockEntity: Send + Sync {
    fn unique_id(&self) -> &str;

    fn name(&self) -> &str;

    async fn snapshot(&self) -> LockSnapshot;

    async fn lock(&self);

    async fn unlock(&self);

    /// Refresh state from the remote device
    async fn update(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingAction {
    Lock,
    Unlock,
}

impl PendingAction {
    pub fn command(&self) -> DeviceCommand {
        match self {
            PendingAction::Lock => DeviceCommand::Close,
            PendingAction::Unlock => DeviceCommand::Open,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            PendingAction::Lock => "locking",
            PendingAction::Unlock => "unlocking",
        }
    }
}

/// Local projection of the remote device, rebuilt on every successful poll
#[derive(Debug, Clone, PartialEq)]
pub struct LockState {
    pub is_locked: Option<bool>,
    pub pending_action: Option<PendingAction>,
    pub pending_since: Option<Instant>,
    pub is_locking: bool,
    pub is_unlocking: bool,
    pub available: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for LockState {
    fn default() -> Self {
        Self {
            is_locked: None,
            pending_action: None,
            pending_since: None,
            is_locking: false,
            is_unlocking: false,
            available: true,
            last_updated: None,
        }
    }
}

impl LockState {
    /// Optimistically mark a command as in flight
    pub fn begin(&mut self, action: PendingAction, now: Instant) {
        self.pending_action = Some(action);
        self.pending_since = Some(now);
        self.is_locking = action == PendingAction::Lock;
        self.is_unlocking = action == PendingAction::Unlock;
    }

    fn clear_pending(&mut self) {
        self.pending_action = None;
        self.pending_since = None;
        self.is_locking = false;
        self.is_unlocking = false;
    }

    /// Reconcile with a status report
    pub fn apply(
        &mut self,
        report: &DeviceStatusReport,
        pending_timeout: Option<Duration>,
        now: Instant,
    ) {
        // Anything but open/close is the lock model's unknown state, not "unlocked"
        self.is_locked = match report.device_status {
            RemoteStatus::Close => Some(true),
            RemoteStatus::Open => Some(false),
            RemoteStatus::Unknown(_) => None,
        };

        if let Some(action) = self.pending_action {
            if report.device_status.matches(action.command()) {
                self.clear_pending();
            } else if let (Some(timeout), Some(since)) = (pending_timeout, self.pending_since) {
                if now.duration_since(since) >= timeout {
                    tracing::warn!(
                        "[CuboLock] Giving up on unconfirmed {} after {:?}",
                        action.command(),
                        timeout
                    );
                    self.clear_pending();
                }
            }
        }

        self.available = report.online;
        self.last_updated = Some(Utc::now());
    }

    pub fn state_name(&self) -> &'static str {
        if !self.available {
            "unavailable"
        } else if self.is_locking {
            "locking"
        } else if self.is_unlocking {
            "unlocking"
        } else {
            match self.is_locked {
                Some(true) => "locked",
                Some(false) => "unlocked",
                None => "unknown",
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<(String, i64)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
    pub suggested_area: String,
}

impl DeviceInfo {
    fn for_device(info: &IntegrationInfo, device_id: i64) -> Self {
        Self {
            identifiers: vec![(info.domain.to_string(), device_id)],
            name: info.name.to_string(),
            manufacturer: info.name.to_string(),
            model: info.name.to_string(),
            sw_version: "1.0".to_string(),
            suggested_area: "External".to_string(),
        }
    }
}

/// Serializable view of a lock, as handed to the host
#[derive(Debug, Clone, Serialize)]
pub struct LockSnapshot {
    pub unique_id: String,
    pub device_id: i64,
    pub name: String,
    pub state: String,
    pub is_locked: Option<bool>,
    pub is_locking: bool,
    pub is_unlocking: bool,
    pub available: bool,
    pub pending_action: Option<PendingAction>,
    pub icon: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub device_info: DeviceInfo,
}

pub struct CuboLock<T: Transport> {
    client: Arc<CuboClient<T>>,
    device_id: i64,
    unique_id: String,
    name: String,
    device_info: DeviceInfo,
    pending_timeout: Option<Duration>,
    state: RwLock<LockState>,
}

impl<T: Transport> CuboLock<T> {
    pub fn new(client: Arc<CuboClient<T>>, device_id: i64, info: &IntegrationInfo) -> Self {
        Self {
            client,
            device_id,
            unique_id: format!("{}_{}", info.domain, device_id),
            name: format!("Cubo {}", device_id),
            device_info: DeviceInfo::for_device(info, device_id),
            pending_timeout: None,
            state: RwLock::new(LockState::default()),
        }
    }

    pub fn with_pending_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pending_timeout = timeout;
        self
    }

    pub fn device_id(&self) -> i64 {
        self.device_id
    }

    pub async fn state(&self) -> LockState {
        self.state.read().await.clone()
    }

    async fn send_command(&self, action: PendingAction) {
        let command = action.command();

        match self
            .client
            .set_device_status(self.device_id, command.as_str())
            .await
        {
            Ok(Some(resp)) if resp.is_ok() && resp.is_acknowledged() => {
                tracing::debug!("[CuboLock] {} {} acknowledged", self.name, action.verb());
            }
            Ok(Some(resp)) => {
                tracing::error!(
                    "[CuboLock] Error {} {}: {} {}",
                    action.verb(),
                    self.name,
                    resp.status,
                    resp.body
                );
            }
            Ok(None) => {
                tracing::error!(
                    "[CuboLock] Error {} {}: no response from cloud",
                    action.verb(),
                    self.name
                );
            }
            Err(e) => {
                tracing::error!("[CuboLock] Error {} {}: {}", action.verb(), self.name, e);
            }
        }

        self.state.write().await.begin(action, Instant::now());
    }
}

#[async_trait]
impl<T: Transport + 'static> LockEntity for CuboLock<T> {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn snapshot(&self) -> LockSnapshot {
        let state = self.state.read().await;

        let icon = if state.is_locked == Some(true) {
            "mdi:lock"
        } else {
            "mdi:lock-open-variant"
        };

        LockSnapshot {
            unique_id: self.unique_id.clone(),
            device_id: self.device_id,
            name: self.name.clone(),
            state: state.state_name().to_string(),
            is_locked: state.is_locked,
            is_locking: state.is_locking,
            is_unlocking: state.is_unlocking,
            available: state.available,
            pending_action: state.pending_action,
            icon: icon.to_string(),
            last_updated: state.last_updated,
            device_info: self.device_info.clone(),
        }
    }

    async fn lock(&self) {
        self.send_command(PendingAction::Lock).await;
    }

    async fn unlock(&self) {
        self.send_command(PendingAction::Unlock).await;
    }

    async fn update(&self) {
        let resp = match self.client.get_device_status(self.device_id).await {
            Ok(Some(resp)) => resp,
            Ok(None) => {
                tracing::warn!("[CuboLock] {} unreachable, marking unavailable", self.name);
                self.state.write().await.available = false;
                return;
            }
            Err(e) => {
                tracing::error!("[CuboLock] Error getting {} status: {}", self.name, e);
                return;
            }
        };

        if !resp.is_ok() {
            tracing::error!(
                "[CuboLock] Error getting {} status: {} {}",
                self.name,
                resp.status,
                resp.body
            );
            return;
        }

        let report = match DeviceStatusReport::from_body(&resp.body) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(
                    "[CuboLock] Error getting {} status ({}): {}",
                    self.name,
                    e,
                    resp.body
                );
                return;
            }
        };

        self.state
            .write()
            .await
            .apply(&report, self.pending_timeout, Instant::now());

        tracing::debug!("[CuboLock] {} status: {}", self.name, resp.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cubo::testing::ScriptedTransport;
    use crate::cubo::Credentials;
    use crate::error::TransportError;
    use serde_json::json;

    fn make_lock(transport: &ScriptedTransport) -> CuboLock<ScriptedTransport> {
        let credentials = Credentials::new("secret", "https://iot.cubo.casa").unwrap();
        let client = Arc::new(CuboClient::with_transport(transport.clone(), credentials));
        CuboLock::new(client, 7, &IntegrationInfo::default())
    }

    #[tokio::test]
    async fn test_identity() {
        let lock = make_lock(&ScriptedTransport::new());

        assert_eq!(lock.unique_id(), "cubocasa_7");
        assert_eq!(lock.name(), "Cubo 7");
        assert_eq!(lock.device_id(), 7);

        let snapshot = lock.snapshot().await;
        assert_eq!(snapshot.state, "unknown");
        assert_eq!(snapshot.icon, "mdi:lock-open-variant");
        assert_eq!(
            snapshot.device_info.identifiers,
            vec![("cubocasa".to_string(), 7)]
        );
        assert_eq!(snapshot.device_info.suggested_area, "External");
    }

    #[tokio::test]
    async fn test_lock_then_confirmed_by_poll() {
        let transport = ScriptedTransport::new();
        transport.push_ok(200, json!({"status": true}));
        transport.push_ok(200, json!({"status": true, "deviceStatus": "close", "online": 1}));
        let lock = make_lock(&transport);

        lock.lock().await;
        let state = lock.state().await;
        assert_eq!(state.pending_action, Some(PendingAction::Lock));
        assert!(state.is_locking);
        assert_eq!(state.state_name(), "locking");

        lock.update().await;
        let state = lock.state().await;
        assert_eq!(state.is_locked, Some(true));
        assert_eq!(state.pending_action, None);
        assert!(!state.is_locking);
        assert!(!state.is_unlocking);
        assert!(state.available);
        assert!(state.last_updated.is_some());

        let snapshot = lock.snapshot().await;
        assert_eq!(snapshot.state, "locked");
        assert_eq!(snapshot.icon, "mdi:lock");
    }

    #[tokio::test]
    async fn test_pending_survives_mismatched_poll() {
        let transport = ScriptedTransport::new();
        transport.push_ok(200, json!({"status": true}));
        transport.push_ok(200, json!({"status": true, "deviceStatus": "close", "online": 1}));
        let lock = make_lock(&transport);

        lock.unlock().await;
        lock.update().await;

        let state = lock.state().await;
        assert_eq!(state.is_locked, Some(true));
        assert_eq!(state.pending_action, Some(PendingAction::Unlock));
        assert!(state.is_unlocking);
        assert!(!state.is_locking);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_command_still_optimistic() {
        let transport = ScriptedTransport::new();
        for _ in 0..4 {
            transport.push_err(TransportError::Connect("refused".to_string()));
        }
        let lock = make_lock(&transport);

        lock.lock().await;

        assert_eq!(transport.attempts(), 4);
        let state = lock.state().await;
        assert_eq!(state.pending_action, Some(PendingAction::Lock));
        assert!(state.is_locking);
        assert!(state.pending_since.is_some());
        assert_eq!(state.state_name(), "locking");
    }

    #[tokio::test]
    async fn test_failed_command_still_optimistic() {
        let transport = ScriptedTransport::new();
        transport.push_ok(500, json!({"status": false}));
        transport.push_ok(200, json!({}));
        let lock = make_lock(&transport);

        lock.lock().await;
        assert_eq!(lock.state().await.pending_action, Some(PendingAction::Lock));

        lock.unlock().await;
        let state = lock.state().await;
        assert_eq!(state.pending_action, Some(PendingAction::Unlock));
        assert!(state.is_unlocking);
        assert!(!state.is_locking);
    }

    #[tokio::test]
    async fn test_missing_fields_leave_state_unchanged() {
        let transport = ScriptedTransport::new();
        transport.push_ok(200, json!({"status": true, "deviceStatus": "open", "online": 1}));
        transport.push_ok(200, json!({"status": true, "online": 1}));
        transport.push_ok(200, json!({"status": true, "deviceStatus": "close"}));
        transport.push_ok(200, json!({"status": false, "deviceStatus": "close", "online": 1}));
        transport.push_ok(404, json!({"status": true, "deviceStatus": "close", "online": 1}));
        let lock = make_lock(&transport);

        lock.update().await;
        let before = lock.state().await;
        assert_eq!(before.is_locked, Some(false));

        for _ in 0..4 {
            lock.update().await;
            assert_eq!(lock.state().await, before);
        }
        assert_eq!(transport.attempts(), 5);
    }

    #[tokio::test]
    async fn test_offline_device_unavailable() {
        let transport = ScriptedTransport::new();
        transport.push_ok(200, json!({"status": true, "deviceStatus": "open", "online": 0}));
        let lock = make_lock(&transport);

        lock.update().await;
        let snapshot = lock.snapshot().await;
        assert!(!snapshot.available);
        assert_eq!(snapshot.is_locked, Some(false));
        assert_eq!(snapshot.state, "unavailable");
    }

    #[tokio::test]
    async fn test_unknown_remote_status() {
        let transport = ScriptedTransport::new();
        transport.push_ok(200, json!({"status": true, "deviceStatus": "close", "online": 1}));
        transport.push_ok(200, json!({"status": true, "deviceStatus": "moving", "online": 1}));
        let lock = make_lock(&transport);

        lock.update().await;
        lock.update().await;
        assert_eq!(lock.state().await.is_locked, None);
        assert_eq!(lock.snapshot().await.state, "unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_marks_unavailable() {
        let transport = ScriptedTransport::new();
        transport.push_ok(200, json!({"status": true, "deviceStatus": "close", "online": 1}));
        for _ in 0..4 {
            transport.push_err(TransportError::Timeout);
        }
        transport.push_ok(200, json!({"status": true, "deviceStatus": "close", "online": 1}));
        let lock = make_lock(&transport);

        lock.update().await;
        lock.update().await;
        let state = lock.state().await;
        assert!(!state.available);
        assert_eq!(state.is_locked, Some(true));

        lock.update().await;
        assert!(lock.state().await.available);
    }

    #[test]
    fn test_pending_timeout_expires() {
        let report = DeviceStatusReport {
            device_status: RemoteStatus::Open,
            online: true,
        };
        let start = Instant::now();
        let timeout = Some(Duration::from_secs(60));

        let mut state = LockState::default();
        state.begin(PendingAction::Lock, start);

        state.apply(&report, timeout, start + Duration::from_secs(30));
        assert_eq!(state.pending_action, Some(PendingAction::Lock));
        assert!(state.is_locking);

        state.apply(&report, timeout, start + Duration::from_secs(60));
        assert_eq!(state.pending_action, None);
        assert!(!state.is_locking);
        assert_eq!(state.is_locked, Some(false));
    }

    #[test]
    fn test_pending_without_timeout_never_expires() {
        let report = DeviceStatusReport {
            device_status: RemoteStatus::Close,
            online: true,
        };
        let start = Instant::now();

        let mut state = LockState::default();
        state.begin(PendingAction::Unlock, start);
        state.apply(&report, None, start + Duration::from_secs(86_400));

        assert_eq!(state.pending_action, Some(PendingAction::Unlock));
        assert_eq!(state.state_name(), "unlocking");
    }
}
