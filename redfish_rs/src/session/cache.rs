//! On-disk session cache.
//!
//! One JSON file per cache directory. Passwords are stored encoded with the
//! session's [`CredentialCodec`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::SessionRecord;
use crate::codec::CredentialCodec;
use crate::error::Condition;

const CACHE_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedSession {
    pub record: SessionRecord,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub pending: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone)]
pub struct SessionCache {
    dir: PathBuf,
}

impl SessionCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn load(&self, codec: &dyn CredentialCodec) -> Result<Option<CachedSession>, Condition> {
        let path = self.path();
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let mut cached: CachedSession = serde_json::from_str(&content).map_err(|e| {
            Condition::InvalidFileFormatting(format!(
                "Session cache {} is corrupt: {}",
                path.display(),
                e
            ))
        })?;
        if let Some(encoded) = cached.record.password.take() {
            cached.record.password = Some(codec.decode(&encoded)?);
        }
        Ok(Some(cached))
    }

    pub fn store(
        &self,
        session: &CachedSession,
        codec: &dyn CredentialCodec,
    ) -> Result<(), Condition> {
        let mut session = session.clone();
        session.record.password = session.record.password.map(|pw| codec.encode(&pw));
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(&session).map_err(anyhow::Error::from)?;
        fs::write(self.path(), json)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), Condition> {
        let path = self.path();
        if path.is_file() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
