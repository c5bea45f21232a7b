//! In-memory Redfish service used by unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use serde_json::Value;

use super::{
    ClientError, Connector, LoginRequest, Resource, RestClient, SessionRecord, type_matches,
};

#[derive(Debug, Default)]
pub struct MockState {
    pub resources: BTreeMap<String, Value>,
    /// Successive bodies served for a path. The last one sticks.
    pub scripted: BTreeMap<String, VecDeque<Value>>,
    pub gets: BTreeMap<String, usize>,
    pub posts: Vec<(String, Value)>,
    pub puts: Vec<(String, Value, Option<String>)>,
    pub patches: Vec<(String, Value, Option<String>)>,
    pub logins: Vec<LoginRequest>,
    pub reconnects: Vec<SessionRecord>,
    pub logouts: usize,
    pub reject_logins: bool,
}

pub type SharedState = Rc<RefCell<MockState>>;

impl MockState {
    pub fn shared() -> SharedState {
        Rc::new(RefCell::new(MockState::default()))
    }

    pub fn get_count(&self, path: &str) -> usize {
        self.gets.get(path).copied().unwrap_or(0)
    }
}

pub struct MockClient {
    state: SharedState,
    url: String,
    username: Option<String>,
    password: Option<String>,
}

impl MockClient {
    pub fn new(state: SharedState, url: &str) -> Self {
        Self {
            state,
            url: url.to_string(),
            username: None,
            password: None,
        }
    }
}

impl RestClient for MockClient {
    fn base_url(&self) -> &str {
        &self.url
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    fn set_username(&mut self, username: String) {
        self.username = Some(username);
    }

    fn set_password(&mut self, password: String) {
        self.password = Some(password);
    }

    fn get(&mut self, path: &str) -> Result<Resource, ClientError> {
        let mut state = self.state.borrow_mut();
        *state.gets.entry(path.to_string()).or_default() += 1;
        if let Some(queue) = state.scripted.get_mut(path) {
            let body = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            if let Some(body) = body {
                return Ok(Resource::new(path, body));
            }
        }
        state
            .resources
            .get(path)
            .cloned()
            .map(|body| Resource::new(path, body))
            .ok_or_else(|| ClientError::Response {
                path: path.to_string(),
                status: 404,
                message: "not found".to_string(),
            })
    }

    fn post(&mut self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.state
            .borrow_mut()
            .posts
            .push((path.to_string(), body.clone()));
        Ok(Value::Null)
    }

    fn put(
        &mut self,
        path: &str,
        body: &Value,
        bios_password: Option<&str>,
    ) -> Result<Value, ClientError> {
        self.state.borrow_mut().puts.push((
            path.to_string(),
            body.clone(),
            bios_password.map(String::from),
        ));
        Ok(Value::Null)
    }

    fn patch(
        &mut self,
        path: &str,
        body: &Value,
        bios_password: Option<&str>,
    ) -> Result<Value, ClientError> {
        self.state.borrow_mut().patches.push((
            path.to_string(),
            body.clone(),
            bios_password.map(String::from),
        ));
        Ok(Value::Null)
    }

    fn select(&mut self, selector: &str) -> Result<Vec<Resource>, ClientError> {
        let state = self.state.borrow();
        Ok(state
            .resources
            .iter()
            .filter(|(_, body)| {
                body.get("@odata.type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| type_matches(t, selector))
            })
            .map(|(path, body)| Resource::new(path.clone(), body.clone()))
            .collect())
    }

    fn types(&mut self) -> Result<Vec<String>, ClientError> {
        let state = self.state.borrow();
        let types: BTreeSet<String> = state
            .resources
            .iter()
            .filter_map(|(path, body)| Resource::new(path.clone(), body.clone()).type_name())
            .collect();
        Ok(types.into_iter().collect())
    }

    fn logout(&mut self) -> Result<(), ClientError> {
        self.state.borrow_mut().logouts += 1;
        Ok(())
    }

    fn record(&self) -> SessionRecord {
        SessionRecord {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            token: Some("mock-token".to_string()),
            session_location: None,
        }
    }
}

pub struct MockConnector {
    pub state: SharedState,
}

impl MockConnector {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }
}

impl Connector for MockConnector {
    fn connect(&self, request: &LoginRequest) -> Result<Box<dyn RestClient>, ClientError> {
        let mut state = self.state.borrow_mut();
        state.logins.push(request.clone());
        if state.reject_logins {
            return Err(ClientError::InvalidCredentials(request.url.clone()));
        }
        let mut client = MockClient::new(Rc::clone(&self.state), &request.url);
        client.username = request.username.clone();
        client.password = request.password.clone();
        Ok(Box::new(client))
    }

    fn reconnect(
        &self,
        record: &SessionRecord,
        _proxy: Option<&str>,
    ) -> Result<Box<dyn RestClient>, ClientError> {
        self.state.borrow_mut().reconnects.push(record.clone());
        let mut client = MockClient::new(Rc::clone(&self.state), &record.url);
        client.username = record.username.clone();
        client.password = record.password.clone();
        Ok(Box::new(client))
    }
}
