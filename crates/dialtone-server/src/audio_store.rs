//! In-memory store for synthesized prompt audio.
//!
//! Artifacts live for the lifetime of the process; nothing is evicted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use uuid::Uuid;

/// MIME type of every stored artifact.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// A stored audio payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Opaque identifier (UUIDv4, simple form).
    pub id: String,
    pub bytes: Arc<[u8]>,
    pub content_type: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioStoreError {
    #[error("audio artifact not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Default)]
pub struct AudioStore {
    artifacts: Arc<RwLock<HashMap<String, AudioArtifact>>>,
}

impl AudioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` under a fresh random id.
    pub fn put(&self, bytes: Vec<u8>) -> AudioArtifact {
        let artifact = AudioArtifact {
            id: Uuid::new_v4().simple().to_string(),
            bytes: Arc::from(bytes),
            content_type: AUDIO_CONTENT_TYPE,
        };
        let mut artifacts = self.artifacts.write().unwrap_or_else(|e| e.into_inner());
        artifacts.insert(artifact.id.clone(), artifact.clone());
        artifact
    }

    /// Looks up an artifact by id.
    pub fn get(&self, id: &str) -> Result<AudioArtifact, AudioStoreError> {
        let artifacts = self.artifacts.read().unwrap_or_else(|e| e.into_inner());
        artifacts
            .get(id)
            .cloned()
            .ok_or_else(|| AudioStoreError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.artifacts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
