//! In-memory [`Transport`] fake shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use apiclient::{
    BearerToken, Cluster, ClusterId, ErrorPayload, FsType, Labels, Licence, LogFormat, LogLevel,
    Namespace, NamespaceId, NamespaceSpec, Node, NodeId, SharedCredentials, Transport,
    TransportError, User, UserId, UserSpec, Version, Volume, VolumeId, VolumeSpec,
};
use async_trait::async_trait;

/// A transport call as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListNamespaces,
    GetNamespace(String),
    ListVolumes(String),
    GetVolume(String, String),
    DeleteVolume(String, String, String),
    DetachVolume(String, String, String),
    SetReplicas(String, String, u64, String),
    DeleteNamespace(String, String),
    DeleteUser(String, String),
    Other(&'static str),
}

pub fn status(code: u16, message: &str) -> TransportError {
    TransportError::Response {
        status: code,
        payload: ErrorPayload::Structured {
            error: message.to_string(),
        },
    }
}

pub fn ns_id(id: &str) -> NamespaceId {
    NamespaceId::new(id).unwrap()
}

pub fn vol_id(id: &str) -> VolumeId {
    VolumeId::new(id).unwrap()
}

pub fn version(v: &str) -> Version {
    Version::new(v).unwrap()
}

pub fn namespace(id: &str) -> Namespace {
    Namespace {
        id: ns_id(id),
        name: id.to_string(),
        labels: Labels::new(),
        created_at: None,
        updated_at: None,
        version: version("ns-v1"),
    }
}

pub fn volume(id: &str, name: &str, ns: &str, v: &str) -> Volume {
    Volume {
        id: vol_id(id),
        name: name.to_string(),
        description: String::new(),
        size_bytes: 5 << 30,
        namespace: ns_id(ns),
        attached_on: None,
        labels: Labels::new(),
        filesystem: FsType::Ext4,
        inode: 0,
        master: None,
        replicas: Vec::new(),
        created_at: None,
        updated_at: None,
        version: version(v),
    }
}

pub fn user(id: &str, username: &str) -> User {
    User {
        id: UserId::new(id).unwrap(),
        username: username.to_string(),
        is_admin: false,
        groups: Vec::new(),
        created_at: None,
        updated_at: None,
        version: version("u-v1"),
    }
}

#[derive(Default)]
struct State {
    namespaces: Vec<Namespace>,
    volumes: HashMap<NamespaceId, Vec<Volume>>,
    volume_errors: HashMap<NamespaceId, TransportError>,
    users: Vec<User>,
}

/// Scripted transport.
///
/// Volume mutations enforce the version token the way the server does: a
/// mismatch answers 412.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<State>,
    namespace_error: Mutex<Option<TransportError>>,
    delays: Mutex<HashMap<NamespaceId, Duration>>,
    namespace_delay: Mutex<Option<Duration>>,
    volume_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<Call>>,
    completed: Mutex<Vec<NamespaceId>>,
    pub credentials: SharedCredentials,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(self, id: &str, volumes: Vec<Volume>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.namespaces.push(namespace(id));
            state.volumes.insert(ns_id(id), volumes);
        }
        self
    }

    /// Listing volumes in `id` answers with `err`.
    pub fn failing(self, id: &str, err: TransportError) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.namespaces.push(namespace(id));
            state.volume_errors.insert(ns_id(id), err);
        }
        self
    }

    pub fn with_user(self, u: User) -> Self {
        self.state.lock().unwrap().users.push(u);
        self
    }

    pub fn namespaces_fail_with(self, err: TransportError) -> Self {
        *self.namespace_error.lock().unwrap() = Some(err);
        self
    }

    pub fn delay_namespace(self, id: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(ns_id(id), delay);
        self
    }

    pub fn delay_namespace_listing(self, delay: Duration) -> Self {
        *self.namespace_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Single-volume reads and deletes wait `delay` before touching state.
    pub fn delay_volume_calls(self, delay: Duration) -> Self {
        *self.volume_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Namespaces whose volume listing ran to completion.
    pub fn completed_listings(&self) -> Vec<NamespaceId> {
        self.completed.lock().unwrap().clone()
    }

    pub fn volume_exists(&self, ns: &str, id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .volumes
            .get(&ns_id(ns))
            .is_some_and(|vols| vols.iter().any(|v| v.id.as_str() == id))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn volume_call_delay(&self) {
        let delay = *self.volume_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn find_volume(&self, ns: &NamespaceId, id: &VolumeId) -> Result<Volume, TransportError> {
        self.state
            .lock()
            .unwrap()
            .volumes
            .get(ns)
            .and_then(|vols| vols.iter().find(|v| &v.id == id).cloned())
            .ok_or_else(|| status(404, "volume not found"))
    }

    fn check_version(&self, ns: &NamespaceId, id: &VolumeId, v: &Version) -> Result<(), TransportError> {
        let current = self.find_volume(ns, id)?;
        if &current.version != v {
            return Err(status(412, "volume version mismatch"));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn authenticate(&self, username: &str, password: &str) -> Result<User, TransportError> {
        self.record(Call::Other("authenticate"));
        let mut guard = self.credentials.write().await;
        if password != "secret" {
            return Err(status(401, "invalid credentials"));
        }
        *guard = BearerToken::new(format!("token-for-{username}"));
        Ok(user("u1", username))
    }

    async fn get_cluster(&self) -> Result<Cluster, TransportError> {
        self.record(Call::Other("get_cluster"));
        Ok(Cluster {
            id: ClusterId::new("c1").unwrap(),
            licence: Licence::default(),
            disable_telemetry: false,
            disable_crash_reporting: false,
            disable_version_check: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Json,
            created_at: None,
            updated_at: None,
            version: version("c-v1"),
        })
    }

    async fn get_node(&self, _id: &NodeId) -> Result<Node, TransportError> {
        Err(status(404, "node not found"))
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, TransportError> {
        Ok(Vec::new())
    }

    async fn get_namespace(&self, id: &NamespaceId) -> Result<Namespace, TransportError> {
        self.record(Call::GetNamespace(id.to_string()));
        self.state
            .lock()
            .unwrap()
            .namespaces
            .iter()
            .find(|ns| &ns.id == id)
            .cloned()
            .ok_or_else(|| status(404, "namespace not found"))
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, TransportError> {
        self.record(Call::ListNamespaces);
        let delay = *self.namespace_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.namespace_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.state.lock().unwrap().namespaces.clone())
    }

    async fn get_user(&self, id: &UserId) -> Result<User, TransportError> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| &u.id == id)
            .cloned()
            .ok_or_else(|| status(404, "user not found"))
    }

    async fn list_users(&self) -> Result<Vec<User>, TransportError> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn get_volume(&self, ns: &NamespaceId, id: &VolumeId) -> Result<Volume, TransportError> {
        self.record(Call::GetVolume(ns.to_string(), id.to_string()));
        self.volume_call_delay().await;
        self.find_volume(ns, id)
    }

    async fn list_volumes(&self, ns: &NamespaceId) -> Result<Vec<Volume>, TransportError> {
        self.record(Call::ListVolumes(ns.to_string()));

        let delay = self.delays.lock().unwrap().get(ns).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let state = self.state.lock().unwrap();
            match state.volume_errors.get(ns) {
                Some(err) => Err(err.clone()),
                None => Ok(state.volumes.get(ns).cloned().unwrap_or_default()),
            }
        };
        self.completed.lock().unwrap().push(ns.clone());
        result
    }

    async fn create_volume(
        &self,
        ns: &NamespaceId,
        spec: &VolumeSpec,
        _async_max: Option<Duration>,
    ) -> Result<Volume, TransportError> {
        let mut state = self.state.lock().unwrap();
        let vols = state
            .volumes
            .get_mut(ns)
            .ok_or_else(|| status(404, "namespace not found"))?;
        if vols.iter().any(|v| v.name == spec.name) {
            return Err(status(409, "volume name already in use"));
        }
        let created = volume(&format!("v{}", vols.len() + 1), &spec.name, ns.as_str(), "v-1");
        vols.push(created.clone());
        Ok(created)
    }

    async fn create_namespace(&self, spec: &NamespaceSpec) -> Result<Namespace, TransportError> {
        let created = namespace(&spec.name);
        let mut state = self.state.lock().unwrap();
        state.namespaces.push(created.clone());
        state.volumes.insert(created.id.clone(), Vec::new());
        Ok(created)
    }

    async fn create_user(&self, spec: &UserSpec) -> Result<User, TransportError> {
        let created = user("u-new", &spec.username);
        self.state.lock().unwrap().users.push(created.clone());
        Ok(created)
    }

    async fn delete_volume(
        &self,
        ns: &NamespaceId,
        id: &VolumeId,
        v: &Version,
        _async_max: Option<Duration>,
    ) -> Result<(), TransportError> {
        self.record(Call::DeleteVolume(ns.to_string(), id.to_string(), v.to_string()));
        self.volume_call_delay().await;
        self.check_version(ns, id, v)?;
        if let Some(vols) = self.state.lock().unwrap().volumes.get_mut(ns) {
            vols.retain(|vol| &vol.id != id);
        }
        Ok(())
    }

    async fn detach_volume(
        &self,
        ns: &NamespaceId,
        id: &VolumeId,
        v: &Version,
    ) -> Result<(), TransportError> {
        self.record(Call::DetachVolume(ns.to_string(), id.to_string(), v.to_string()));
        let current = self.find_volume(ns, id)?;
        if current.attached_on.is_none() {
            return Err(status(422, "volume is not attached"));
        }
        self.check_version(ns, id, v)
    }

    async fn set_replicas(
        &self,
        ns: &NamespaceId,
        id: &VolumeId,
        replicas: u64,
        v: &Version,
    ) -> Result<Volume, TransportError> {
        self.record(Call::SetReplicas(
            ns.to_string(),
            id.to_string(),
            replicas,
            v.to_string(),
        ));
        self.check_version(ns, id, v)?;
        let mut updated = self.find_volume(ns, id)?;
        updated.version = version("bumped");
        Ok(updated)
    }

    async fn delete_namespace(&self, id: &NamespaceId, v: &Version) -> Result<(), TransportError> {
        self.record(Call::DeleteNamespace(id.to_string(), v.to_string()));
        Ok(())
    }

    async fn delete_user(&self, id: &UserId, v: &Version) -> Result<(), TransportError> {
        self.record(Call::DeleteUser(id.to_string(), v.to_string()));
        Ok(())
    }
}
