//! # Application State
//!
//! Shared state for the Axum application. The engine is synchronous;
//! the lock provides the outer concurrency model: many readers or one
//! writer, matching the engine's snapshot-read / serialized-write
//! contract.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use grc_engine::ComplianceEngine;

use crate::error::AppError;

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    engine: Arc<RwLock<ComplianceEngine>>,
}

impl AppState {
    /// Wrap an engine for shared use.
    pub fn new(engine: ComplianceEngine) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }

    /// Acquire the engine for reading.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, ComplianceEngine>, AppError> {
        self.engine
            .read()
            .map_err(|_| AppError::Internal("engine lock poisoned".into()))
    }

    /// Acquire the engine for writing.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, ComplianceEngine>, AppError> {
        self.engine
            .write()
            .map_err(|_| AppError::Internal("engine lock poisoned".into()))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ComplianceEngine::default())
    }
}
