//! Redfish transport abstraction.
//!
//! Commands and the session layer only ever see [`RestClient`] and
//! [`Connector`]. The production implementation lives in [`http`]; unit tests
//! drive everything through the in-memory client in `mock`.

pub mod http;

#[cfg(test)]
pub(crate) mod mock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Property names never offered for `get`/`set` or tab completion.
pub const HIDDEN_PROPERTIES: &[&str] = &[
    "name",
    "modified",
    "type",
    "description",
    "attributeregistry",
    "links",
    "settingsresult",
    "actions",
    "availableactions",
    "id",
    "extref",
];

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No client is available, please login first.")]
    Undefined,

    #[error("Session expired or invalid.")]
    SessionExpired,

    #[error("Retries exhausted while contacting {0}.")]
    RetriesExhausted(String),

    #[error("Invalid credentials for {0}.")]
    InvalidCredentials(String),

    #[error("Server {url} is down or unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Malformed response from {path}: {reason}")]
    MalformedResponse { path: String, reason: String },

    #[error("{path} returned HTTP {status}: {message}")]
    Response {
        path: String,
        status: u16,
        message: String,
    },

    #[error("No instances found for '{0}'.")]
    InstanceNotFound(String),

    #[error("{0}")]
    Transport(String),
}

/// A fetched Redfish resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub path: String,
    pub body: Value,
}

impl Resource {
    pub fn new(path: impl Into<String>, body: Value) -> Self {
        Self {
            path: path.into(),
            body,
        }
    }

    /// `@odata.type` without the leading `#`, e.g. `Bios.v1_0_0.Bios`.
    pub fn odata_type(&self) -> Option<&str> {
        self.body
            .get("@odata.type")
            .and_then(Value::as_str)
            .map(|t| t.trim_start_matches('#'))
    }

    /// Short type name, e.g. `Bios.v1_0_0` for `#Bios.v1_0_0.Bios`.
    pub fn type_name(&self) -> Option<String> {
        let full = self.odata_type()?;
        match full.rsplit_once('.') {
            Some((head, _)) if head.contains('.') => Some(head.to_string()),
            _ => Some(full.to_string()),
        }
    }

    pub fn is_bios(&self) -> bool {
        self.odata_type()
            .is_some_and(|t| t.to_lowercase().starts_with("bios."))
    }

    /// Settable properties of the resource. BIOS resources expose their
    /// `Attributes` object; everything else exposes top-level keys minus
    /// metadata.
    pub fn properties(&self) -> Map<String, Value> {
        let source = if self.is_bios() {
            self.body.get("Attributes").and_then(Value::as_object)
        } else {
            self.body.as_object()
        };
        let Some(source) = source else {
            return Map::new();
        };
        source
            .iter()
            .filter(|(key, _)| is_visible_property(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Target of `@Redfish.Settings`, falling back to the resource itself.
    pub fn settings_path(&self) -> String {
        self.body
            .pointer("/@Redfish.Settings/SettingsObject/@odata.id")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| self.path.clone())
    }

    /// Target URI of the first action whose name contains `fragment`.
    pub fn action_target(&self, fragment: &str) -> Option<String> {
        find_action_target(self.body.get("Actions")?, fragment)
    }
}

/// Looks through an `Actions` object for an action name containing
/// `fragment` and returns its `target`.
pub fn find_action_target(actions: &Value, fragment: &str) -> Option<String> {
    actions
        .as_object()?
        .iter()
        .find(|(name, _)| name.contains(fragment))
        .and_then(|(_, action)| action.get("target"))
        .and_then(Value::as_str)
        .map(String::from)
}

pub fn is_visible_property(key: &str) -> bool {
    !key.contains("@odata") && !HIDDEN_PROPERTIES.contains(&key.to_lowercase().as_str())
}

/// Parameters for opening a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginRequest {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub proxy: Option<String>,
}

/// Everything needed to resume a session in a later process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub session_location: Option<String>,
}

/// An authenticated connection to one management controller.
pub trait RestClient {
    fn base_url(&self) -> &str;
    fn username(&self) -> Option<&str>;
    fn password(&self) -> Option<&str>;
    fn set_username(&mut self, username: String);
    fn set_password(&mut self, password: String);

    fn get(&mut self, path: &str) -> Result<Resource, ClientError>;
    fn post(&mut self, path: &str, body: &Value) -> Result<Value, ClientError>;
    fn put(
        &mut self,
        path: &str,
        body: &Value,
        bios_password: Option<&str>,
    ) -> Result<Value, ClientError>;
    fn patch(
        &mut self,
        path: &str,
        body: &Value,
        bios_password: Option<&str>,
    ) -> Result<Value, ClientError>;

    /// Resources whose type starts with `selector` (case-insensitive).
    fn select(&mut self, selector: &str) -> Result<Vec<Resource>, ClientError>;

    /// Every type name the client has discovered, sorted.
    fn types(&mut self) -> Result<Vec<String>, ClientError>;

    fn logout(&mut self) -> Result<(), ClientError>;

    fn record(&self) -> SessionRecord;
}

/// Opens clients. Separated from [`RestClient`] so the session layer can be
/// exercised without a network.
pub trait Connector {
    fn connect(&self, request: &LoginRequest) -> Result<Box<dyn RestClient>, ClientError>;

    fn reconnect(
        &self,
        record: &SessionRecord,
        proxy: Option<&str>,
    ) -> Result<Box<dyn RestClient>, ClientError>;
}

/// Matches a resource type against a selector the way `select` does.
pub(crate) fn type_matches(odata_type: &str, selector: &str) -> bool {
    let selector = selector.trim_start_matches('#').to_lowercase();
    !selector.is_empty()
        && odata_type
            .trim_start_matches('#')
            .to_lowercase()
            .starts_with(&selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bios_properties_come_from_attributes() {
        let bios = Resource::new(
            "/redfish/v1/Systems/1/Bios/",
            json!({
                "@odata.type": "#Bios.v1_0_0.Bios",
                "AttributeRegistry": "BiosAttributeRegistryU30.v1_2_10",
                "Attributes": {"BootMode": "Uefi", "AdminName": ""}
            }),
        );
        let props = bios.properties();
        assert!(props.contains_key("BootMode"));
        assert!(props.contains_key("AdminName"));
        assert!(!props.contains_key("AttributeRegistry"));
    }

    #[test]
    fn test_hidden_and_odata_keys_are_filtered() {
        let system = Resource::new(
            "/redfish/v1/Systems/1/",
            json!({
                "@odata.type": "#ComputerSystem.v1_4_0.ComputerSystem",
                "@odata.id": "/redfish/v1/Systems/1/",
                "Id": "1",
                "Name": "Computer System",
                "AssetTag": "",
                "IndicatorLED": "Off"
            }),
        );
        let keys: Vec<_> = system.properties().keys().cloned().collect();
        assert_eq!(keys, vec!["AssetTag", "IndicatorLED"]);
    }

    #[test]
    fn test_type_name_strips_trailing_segment() {
        let r = Resource::new("/x", json!({"@odata.type": "#Bios.v1_0_0.Bios"}));
        assert_eq!(r.type_name().as_deref(), Some("Bios.v1_0_0"));
    }

    #[test]
    fn test_settings_path_prefers_settings_object() {
        let r = Resource::new(
            "/redfish/v1/Systems/1/Bios/",
            json!({"@Redfish.Settings": {"SettingsObject": {"@odata.id": "/redfish/v1/Systems/1/Bios/Settings/"}}}),
        );
        assert_eq!(r.settings_path(), "/redfish/v1/Systems/1/Bios/Settings/");
    }

    #[test]
    fn test_type_matches_is_case_insensitive_prefix() {
        assert!(type_matches("#Bios.v1_0_0.Bios", "bios."));
        assert!(type_matches("ComputerSystem.v1_4_0.ComputerSystem", "ComputerSystem."));
        assert!(!type_matches("#Bios.v1_0_0.Bios", ""));
        assert!(!type_matches("#Manager.v1_5_1.Manager", "Bios"));
    }
}
