//! # Consent Store
//!
//! File-backed set of (user, consent type) pairs. The whole file is
//! rewritten on every mutation; a crash mid-write can lose records, which
//! callers of this store accept.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::traits::ConsentStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsentRecord {
    pub user_id: u64,
    pub consent_type: String,
}

pub struct FileConsentStore {
    path: PathBuf,
    records: Mutex<Vec<ConsentRecord>>,
}

impl FileConsentStore {
    /// Loads existing records from `path`; a missing file is an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read consent file {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("failed to parse consent file {}", path.display()))?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    async fn save(&self, records: &[ConsentRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, json)
            .await
            .context("failed to save consent data")?;
        Ok(())
    }
}

fn validate_consent_type(consent_type: &str) -> Result<()> {
    if consent_type.trim().is_empty() {
        bail!("consent type cannot be empty");
    }
    Ok(())
}

#[async_trait]
impl ConsentStore for FileConsentStore {
    async fn has_consented(&self, user_id: u64, consent_type: &str) -> Result<bool> {
        validate_consent_type(consent_type)?;
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .any(|record| record.user_id == user_id && record.consent_type == consent_type))
    }

    async fn add_consent(&self, user_id: u64, consent_type: &str) -> Result<()> {
        validate_consent_type(consent_type)?;
        let mut records = self.records.lock().await;
        if records
            .iter()
            .any(|record| record.user_id == user_id && record.consent_type == consent_type)
        {
            info!("user {user_id} already has consent for {consent_type}");
            return Ok(());
        }
        records.push(ConsentRecord {
            user_id,
            consent_type: consent_type.to_string(),
        });
        self.save(&records).await
    }

    async fn remove_consent(&self, user_id: u64, consent_type: &str) -> Result<()> {
        validate_consent_type(consent_type)?;
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|record| !(record.user_id == user_id && record.consent_type == consent_type));
        if records.len() == before {
            info!("user {user_id} does not have consent for {consent_type}");
            return Ok(());
        }
        info!("user {user_id} consent for {consent_type} removed");
        self.save(&records).await
    }
}
