use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use base64::Engine;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, trace};

use crate::web::cookies::CookieStore;
use crate::web::request::{WebRequest, WebResponse};

/// Cookie that carries the framework-managed session id.
pub const SESSION_ID_COOKIE_NAME: &str = "palisadeSid";

/// Keyed attribute store scoped to one subject across requests. Attribute
/// absence is a first-class state, distinct from any stored value (including a
/// stored `false`); readers must get `None` back, not a default.
pub trait Session: Send + Sync + std::fmt::Debug {
    fn id(&self) -> &str;
    fn get_attribute(&self, key: &str) -> Option<Value>;
    fn set_attribute(&self, key: &str, value: Value);
    fn remove_attribute(&self, key: &str) -> Option<Value>;
}

pub type SessionHandle = Arc<dyn Session>;

fn gen_id() -> String {
    // random id, base64url without padding
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// In-memory session: a mutex-guarded attribute map with a generated id. Both
/// factories hand these out; the session store's own locking is the only
/// cross-request synchronization this layer relies on.
#[derive(Debug)]
pub struct MapSession {
    id: String,
    attrs: Mutex<HashMap<String, Value>>,
}

impl MapSession {
    pub fn new() -> Self {
        Self { id: gen_id(), attrs: Mutex::new(HashMap::new()) }
    }
}

impl Default for MapSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MapSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn get_attribute(&self, key: &str) -> Option<Value> {
        self.attrs.lock().get(key).cloned()
    }

    fn set_attribute(&self, key: &str, value: Value) {
        self.attrs.lock().insert(key.to_string(), value);
    }

    fn remove_attribute(&self, key: &str) -> Option<Value> {
        self.attrs.lock().remove(key)
    }
}

/// Resolves or creates the session for a request/response exchange.
pub trait WebSessionFactory: Send + Sync {
    /// Existing session for this exchange, or `None`. Never creates one; no
    /// session is a valid outcome for an anonymous request.
    fn get_session(&self, request: &WebRequest, response: &WebResponse) -> Option<SessionHandle>;

    /// Existing session, or a newly created one.
    fn start_session(
        &self,
        request: &WebRequest,
        response: &mut WebResponse,
    ) -> Result<SessionHandle>;
}

/// Container-managed mode: sessions belong to the host transport, which
/// attaches them to the request (and can mint one on demand).
#[derive(Debug, Default)]
pub struct ContainerWebSessionFactory;

impl WebSessionFactory for ContainerWebSessionFactory {
    fn get_session(&self, request: &WebRequest, _response: &WebResponse) -> Option<SessionHandle> {
        request.container_session()
    }

    fn start_session(
        &self,
        request: &WebRequest,
        _response: &mut WebResponse,
    ) -> Result<SessionHandle> {
        Ok(request.start_container_session()?)
    }
}

/// Framework-managed mode: this layer owns the session registry and tracks the
/// session id in its own cookie.
pub struct NativeWebSessionFactory {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    sid_cookie: CookieStore<String>,
}

impl NativeWebSessionFactory {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            sid_cookie: CookieStore::new(SESSION_ID_COOKIE_NAME),
        }
    }

    pub fn with_cookie_name(name: impl Into<String>) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), sid_cookie: CookieStore::new(name) }
    }

    fn session_id(&self, request: &WebRequest, response: &WebResponse) -> Option<String> {
        // A session started earlier in this same exchange lives in the
        // response cookie, not the request one.
        self.sid_cookie
            .retrieve_value(request)
            .or_else(|| response.cookie(self.sid_cookie.name()).map(str::to_string))
    }
}

impl Default for NativeWebSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSessionFactory for NativeWebSessionFactory {
    fn get_session(&self, request: &WebRequest, response: &WebResponse) -> Option<SessionHandle> {
        let sid = self.session_id(request, response)?;
        let found = self.sessions.read().get(&sid).cloned();
        if found.is_none() {
            debug!("session_id_unknown_or_expired");
        }
        found
    }

    fn start_session(
        &self,
        request: &WebRequest,
        response: &mut WebResponse,
    ) -> Result<SessionHandle> {
        if let Some(existing) = self.get_session(request, response) {
            return Ok(existing);
        }
        let session: SessionHandle = Arc::new(MapSession::new());
        let sid = session.id().to_string();
        self.sid_cookie.store_value(&sid, response)?;
        self.sessions.write().insert(sid, session.clone());
        trace!("session_started");
        Ok(session)
    }
}
