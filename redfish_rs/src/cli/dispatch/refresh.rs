//! Completion list refresh after a command ran.

use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{ClientError, Resource};
use crate::completion::CompletionUpdates;
use crate::context::AppContext;
use crate::session::ClientHandle;

const REGISTRIES_PATH: &str = "/redfish/v1/Registries/";

/// `select` offers the server's types; `get` and `set` offer the property
/// names of the current selection. With `with_registry` the attribute
/// registry of the selection is loaded as value metadata.
pub(super) fn completion_updates(ctx: &mut AppContext, with_registry: bool) -> CompletionUpdates {
    let mut updates = CompletionUpdates {
        val: Some(Vec::new()),
        ..CompletionUpdates::default()
    };
    let selector = ctx.session.selector().map(String::from);
    let Ok(client) = ctx.session.client_mut() else {
        return updates;
    };

    match client.types() {
        Ok(types) => {
            updates.lists.insert("select".to_string(), types);
        }
        Err(err) => debug!(error = %err, "unable to list types for completion"),
    }

    let Some(selector) = selector else {
        return updates;
    };
    let instance = match client.select(&selector) {
        Ok(instances) => instances.into_iter().next(),
        Err(err) => {
            debug!(error = %err, %selector, "unable to refresh property completion");
            None
        }
    };
    let Some(instance) = instance else {
        return updates;
    };

    let properties = instance.properties();
    let names: Vec<String> = properties.keys().cloned().collect();
    updates.lists.insert("get".to_string(), names.clone());
    updates.lists.insert("set".to_string(), names);

    if with_registry {
        match attribute_registry(client, &instance) {
            Ok(Some(entries)) => {
                let infovals: Map<String, Value> = entries
                    .into_iter()
                    .filter(|(name, _)| properties.contains_key(name))
                    .collect();
                updates.infovals = Some(infovals);
            }
            Ok(None) => {}
            Err(err) => debug!(error = %err, "attribute registry unavailable"),
        }
    }
    updates
}

/// Attribute entries keyed by `AttributeName`, when the resource names a
/// registry the service publishes.
fn attribute_registry(
    client: &mut ClientHandle,
    instance: &Resource,
) -> Result<Option<Map<String, Value>>, ClientError> {
    let Some(registry) = instance.body.get("AttributeRegistry").and_then(Value::as_str) else {
        return Ok(None);
    };
    let file = client.get(&format!("{}{}/", REGISTRIES_PATH, registry))?;
    let Some(location) = file
        .body
        .pointer("/Location/0/Uri")
        .and_then(Value::as_str)
    else {
        return Ok(None);
    };
    let body = client.get(location)?.body;
    let Some(attributes) = body
        .pointer("/RegistryEntries/Attributes")
        .and_then(Value::as_array)
    else {
        return Ok(None);
    };
    Ok(Some(
        attributes
            .iter()
            .filter_map(|entry| {
                let name = entry.get("AttributeName")?.as_str()?;
                Some((name.to_string(), entry.clone()))
            })
            .collect(),
    ))
}
