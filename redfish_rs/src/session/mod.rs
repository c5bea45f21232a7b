//! Session state shared by all commands.
//!
//! A [`SessionContext`] owns the live client (if any), the current type
//! selection and the changes staged by `set` but not yet committed. When
//! caching is enabled the whole thing survives between one-shot invocations.

pub mod cache;
pub mod resolver;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::client::{Connector, LoginRequest, RestClient};
use crate::codec::CredentialCodec;
use crate::error::Condition;

pub use cache::{CachedSession, SessionCache};
pub use resolver::{CredentialArgs, LoginPlan, resolve};

pub type ClientHandle = Box<dyn RestClient>;

pub struct SessionContext {
    connector: Box<dyn Connector>,
    codec: Box<dyn CredentialCodec>,
    client: Option<ClientHandle>,
    cache: Option<SessionCache>,
    proxy: Option<String>,
    selector: Option<String>,
    pending: BTreeMap<String, Map<String, Value>>,
}

impl SessionContext {
    /// `cache` is `None` when sessions must not outlive the process.
    pub fn new(
        connector: Box<dyn Connector>,
        codec: Box<dyn CredentialCodec>,
        cache: Option<SessionCache>,
        proxy: Option<String>,
    ) -> Self {
        Self {
            connector,
            codec,
            client: None,
            cache,
            proxy,
            selector: None,
            pending: BTreeMap::new(),
        }
    }

    pub fn codec(&self) -> &dyn CredentialCodec {
        self.codec.as_ref()
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&ClientHandle> {
        self.client.as_ref()
    }

    /// The live client, or `UndefinedClient` when nobody has logged in.
    pub fn client_mut(&mut self) -> Result<&mut ClientHandle, Condition> {
        self.client.as_mut().ok_or(Condition::UndefinedClient)
    }

    pub fn login(&mut self, mut request: LoginRequest) -> Result<(), Condition> {
        if request.proxy.is_none() {
            request.proxy = self.proxy.clone();
        }
        self.logout();
        let client = self.connector.connect(&request)?;
        info!(url = %request.url, "logged in");
        self.client = Some(client);
        Ok(())
    }

    /// Ends the live (or cached) session and forgets all session state.
    pub fn logout(&mut self) {
        let client = self.client.take().or_else(|| self.cached_client());
        if let Some(mut client) = client {
            match client.logout() {
                Ok(()) => debug!(url = %client.base_url(), "session closed"),
                Err(err) => debug!("ignoring logout failure: {}", err),
            }
        }
        self.selector = None;
        self.pending.clear();
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.clear() {
                warn!("unable to remove session cache: {}", err);
            }
        }
    }

    /// Picks up a session cached by an earlier invocation.
    pub fn restore(&mut self) {
        if self.client.is_some() {
            return;
        }
        let Some(cache) = &self.cache else {
            return;
        };
        match cache.load(self.codec.as_ref()) {
            Ok(Some(cached)) => {
                match self
                    .connector
                    .reconnect(&cached.record, self.proxy.as_deref())
                {
                    Ok(client) => {
                        debug!(url = %cached.record.url, "restored cached session");
                        self.client = Some(client);
                        self.selector = cached.selector;
                        self.pending = cached.pending;
                    }
                    Err(err) => warn!("unable to restore cached session: {}", err),
                }
            }
            Ok(None) => {}
            Err(err) => warn!("ignoring session cache: {}", err),
        }
    }

    pub fn save(&self) -> Result<(), Condition> {
        let (Some(cache), Some(client)) = (&self.cache, &self.client) else {
            return Ok(());
        };
        let cached = CachedSession {
            record: client.record(),
            selector: self.selector.clone(),
            pending: self.pending.clone(),
        };
        cache.store(&cached, self.codec.as_ref())
    }

    fn cached_client(&self) -> Option<ClientHandle> {
        let cache = self.cache.as_ref()?;
        let cached = cache.load(self.codec.as_ref()).ok()??;
        self.connector
            .reconnect(&cached.record, self.proxy.as_deref())
            .ok()
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn set_selector(&mut self, selector: Option<String>) {
        self.selector = selector;
    }

    pub fn pending(&self) -> &BTreeMap<String, Map<String, Value>> {
        &self.pending
    }

    /// Merges `changes` into whatever is already staged for `path`.
    pub fn stage(&mut self, path: &str, changes: Map<String, Value>) {
        let entry = self.pending.entry(path.to_string()).or_default();
        for (key, value) in changes {
            merge_value(entry, key, value);
        }
    }

    pub fn take_pending(&mut self) -> BTreeMap<String, Map<String, Value>> {
        std::mem::take(&mut self.pending)
    }
}

fn merge_value(target: &mut Map<String, Value>, key: String, value: Value) {
    match (target.get_mut(&key), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                merge_value(existing, k, v);
            }
        }
        (_, value) => {
            target.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockConnector, MockState};
    use crate::codec::Base64Codec;
    use serde_json::json;
    use tempfile::TempDir;

    fn context(state: &crate::client::mock::SharedState, cache: Option<SessionCache>) -> SessionContext {
        SessionContext::new(
            Box::new(MockConnector::new(state.clone())),
            Box::new(Base64Codec),
            cache,
            None,
        )
    }

    fn request() -> LoginRequest {
        LoginRequest {
            url: "https://10.0.0.100".into(),
            username: Some("admin".into()),
            password: Some("password".into()),
            proxy: None,
        }
    }

    #[test]
    fn test_client_mut_without_login_is_undefined() {
        let state = MockState::shared();
        let mut session = context(&state, None);
        assert!(matches!(session.client_mut(), Err(Condition::UndefinedClient)));
    }

    #[test]
    fn test_save_then_restore_in_new_context() {
        let tmp = TempDir::new().unwrap();
        let state = MockState::shared();

        let mut first = context(&state, Some(SessionCache::new(tmp.path().to_path_buf())));
        first.login(request()).unwrap();
        first.set_selector(Some("Bios.".into()));
        first.save().unwrap();

        let mut second = context(&state, Some(SessionCache::new(tmp.path().to_path_buf())));
        second.restore();
        assert!(second.is_logged_in());
        assert_eq!(second.selector(), Some("Bios."));
        let state = state.borrow();
        assert_eq!(state.reconnects.len(), 1);
        assert_eq!(state.reconnects[0].password.as_deref(), Some("password"));
    }

    #[test]
    fn test_logout_clears_cache_and_state() {
        let tmp = TempDir::new().unwrap();
        let state = MockState::shared();
        let cache = SessionCache::new(tmp.path().to_path_buf());
        let mut session = context(&state, Some(cache.clone()));
        session.login(request()).unwrap();
        session.stage("/redfish/v1/Systems/1/", Map::new());
        session.save().unwrap();

        session.logout();
        assert!(!session.is_logged_in());
        assert!(session.pending().is_empty());
        assert!(!cache.exists());
        assert_eq!(state.borrow().logouts, 1);
    }

    #[test]
    fn test_logout_without_client_ends_cached_session() {
        let tmp = TempDir::new().unwrap();
        let state = MockState::shared();
        let cache = SessionCache::new(tmp.path().to_path_buf());
        let mut first = context(&state, Some(cache.clone()));
        first.login(request()).unwrap();
        first.save().unwrap();

        let mut second = context(&state, Some(cache.clone()));
        second.logout();
        assert_eq!(state.borrow().logouts, 1);
        assert!(!cache.exists());
    }

    #[test]
    fn test_stage_merges_nested_objects() {
        let state = MockState::shared();
        let mut session = context(&state, None);
        let path = "/redfish/v1/Systems/1/Bios/Settings/";
        session.stage(path, json!({"Attributes": {"BootMode": "Uefi"}}).as_object().cloned().unwrap());
        session.stage(path, json!({"Attributes": {"AdminName": "ops"}}).as_object().cloned().unwrap());
        assert_eq!(
            Value::Object(session.pending()[path].clone()),
            json!({"Attributes": {"BootMode": "Uefi", "AdminName": "ops"}})
        );
    }
}
