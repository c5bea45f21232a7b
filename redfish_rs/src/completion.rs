//! Tab completion state machine for the interactive shell.
//!
//! Completion is multi-level: command names, then property names of the
//! current selection, then the allowed values of a property. A second tab on
//! a fully typed property (`set BootMode` or `set BootMode=`) switches the
//! engine into value mode using the metadata in [`CompletionOptions::infovals`].
//!
//! The engine follows the readline protocol: [`CompletionEngine::complete`] is
//! called with `state = 0, 1, 2, ...` until it returns `None`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Candidate lists the engine draws from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// Top-level word -> candidates for its arguments.
    pub lists: BTreeMap<String, Vec<String>>,
    /// Property name -> attribute/schema metadata.
    pub infovals: Map<String, Value>,
    /// Values currently offered after `PROPERTY=`.
    pub val: Vec<String>,
}

/// Fresh lists produced after a command runs. Absent fields leave the
/// existing options alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionUpdates {
    pub lists: BTreeMap<String, Vec<String>>,
    pub infovals: Option<Map<String, Value>>,
    pub val: Option<Vec<String>>,
}

impl CompletionUpdates {
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.infovals.is_none() && self.val.is_none()
    }
}

#[derive(Debug, Default)]
pub struct CompletionEngine {
    options: CompletionOptions,
    current_candidates: Vec<String>,
    possible_vals: Vec<String>,
    val_pos: usize,
}

impl CompletionEngine {
    pub fn new(options: CompletionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    /// Returns the `state`-th candidate for the word spanning
    /// `line[begin..end]`.
    pub fn complete(&mut self, line: &str, begin: usize, end: usize, state: usize) -> Option<String> {
        if state == 0 {
            self.start_round(line, begin, end);
        }
        if self.possible_vals.is_empty() {
            self.current_candidates.get(state).cloned()
        } else {
            self.possible_vals.get(state).cloned()
        }
    }

    /// Collects every candidate for one completion request.
    pub fn candidates(&mut self, line: &str, begin: usize, end: usize) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(candidate) = self.complete(line, begin, end, out.len()) {
            out.push(candidate);
        }
        out
    }

    pub fn updates_tab_completion_lists(&mut self, updates: CompletionUpdates) {
        for (word, list) in updates.lists {
            self.options.lists.insert(word, list);
        }
        if let Some(infovals) = updates.infovals {
            self.options.infovals = infovals;
        }
        if let Some(val) = updates.val {
            self.options.val = val;
        }
    }

    fn start_round(&mut self, line: &str, begin: usize, end: usize) {
        let words: Vec<&str> = line.split_whitespace().collect();
        let fragment = line.get(begin..end).unwrap_or("");

        if words.is_empty() || (begin == 0 && fragment.is_empty()) {
            self.current_candidates = self.options.lists.keys().cloned().collect();
            self.possible_vals.clear();
            return;
        }

        if self.narrow(&words, fragment, begin).is_none() {
            self.current_candidates.clear();
            self.possible_vals.clear();
        }
    }

    /// `None` means a lookup failed and nothing should be offered.
    fn narrow(&mut self, words: &[&str], fragment: &str, begin: usize) -> Option<()> {
        let command = words[0];
        let last = words[words.len() - 1];
        let mut assignment: Option<(&str, &str)> = None;

        let candidates = if begin == 0 {
            self.options.lists.keys().cloned().collect()
        } else if last.contains('=') && words.len() > 1 {
            let mut parts = last.split('=');
            let property = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();
            assignment = Some((property, value));
            if value.is_empty() {
                self.options.lists.get(command)?.clone()
            } else {
                let keys: Vec<&str> = words
                    .iter()
                    .filter(|w| w.contains('='))
                    .map(|w| w.split('=').next().unwrap_or_default())
                    .collect();
                let switched_property =
                    keys.len() > 1 && keys[keys.len() - 2] != keys[keys.len() - 1];
                if switched_property && self.val_pos > 1 {
                    Vec::new()
                } else {
                    self.options.val.clone()
                }
            }
        } else {
            let list = self.options.lists.get(command)?.clone();
            self.possible_vals.clear();
            list
        };

        if fragment.is_empty() && assignment.is_none() {
            self.current_candidates = candidates;
            return Some(());
        }

        let fragment = match assignment {
            Some((_, value)) if !value.is_empty() && !candidates.iter().any(|c| c == value) => value,
            Some((property, _)) => property,
            None => fragment,
        };
        let needle = fragment.to_lowercase();
        self.current_candidates = candidates
            .into_iter()
            .filter(|c| !c.is_empty() && c.to_lowercase().starts_with(&needle))
            .collect();
        self.possible_vals.clear();

        if (self.current_candidates.len() == 1 && command.contains("set")) || assignment.is_some() {
            let first = self.current_candidates.first()?.clone();
            if fragment == first {
                if let Some(meta) = self.options.infovals.get(fragment) {
                    self.possible_vals = value_candidates(meta)?;
                }
                if !self.possible_vals.is_empty() {
                    self.options.val = self.possible_vals.clone();
                    self.val_pos = 0;
                }
            } else {
                self.possible_vals.push(first);
                self.val_pos += 1;
            }
        }
        Some(())
    }
}

/// Allowed values for a property given its registry or schema metadata.
fn value_candidates(meta: &Value) -> Option<Vec<String>> {
    if let Some(kind) = meta.get("Type") {
        if !mentions(kind, "Enumeration") {
            return Some(Vec::new());
        }
        if let Some(values) = meta.get("Value").and_then(Value::as_array) {
            return values
                .iter()
                .map(|v| v.get("ValueName").and_then(Value::as_str).map(String::from))
                .collect();
        }
    }

    let kind = meta.get("type")?;
    let mut values: Vec<String> = if mentions(kind, "boolean") {
        vec!["True".to_string(), "False".to_string()]
    } else if mentions(kind, "string") {
        meta.get("enum")?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    } else {
        Vec::new()
    };
    if !values.is_empty() && mentions(kind, "null") {
        values.push("None".to_string());
    }
    Some(values)
}

/// Substring test on a string, membership test on an array.
fn mentions(kind: &Value, token: &str) -> bool {
    match kind {
        Value::String(s) => s.contains(token),
        Value::Array(items) => items.iter().any(|item| item.as_str() == Some(token)),
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
