//! Host-facing capability interface.
//!
//! Hosts that manage several velocity models dispatch through
//! [`VelocityModelBackend`]. [`ModelSlot`] adds an explicit
//! uninitialized/ready state for hosts that need to hold a model that may
//! not have been loaded yet.

use std::path::Path;

use tracing::warn;

use crate::config::LoadOptions;
use crate::error::{ModelError, Result};
use crate::model::VelocityModel;
use crate::types::{PropertyTuple, QueryPoint};

/// Operations every velocity model exposes to a host.
pub trait VelocityModelBackend: Sized + Send + Sync {
    /// Load the model installed under `install_dir` as `label`.
    fn initialize(install_dir: &Path, label: &str, options: &LoadOptions) -> Result<Self>;

    /// Query a batch of points, one result per point in input order.
    fn query(&self, points: &[QueryPoint]) -> Result<Vec<PropertyTuple>>;

    /// Release the model.
    fn finalize(self) -> Result<()>;

    /// Model version string.
    fn version(&self) -> &str;

    /// Effective configuration text and its number of entries.
    fn config(&self) -> (String, usize);
}

impl VelocityModelBackend for VelocityModel {
    fn initialize(install_dir: &Path, label: &str, options: &LoadOptions) -> Result<Self> {
        VelocityModel::initialize_with(install_dir, label, options)
    }

    fn query(&self, points: &[QueryPoint]) -> Result<Vec<PropertyTuple>> {
        VelocityModel::query(self, points)
    }

    fn finalize(self) -> Result<()> {
        VelocityModel::finalize(self)
    }

    fn version(&self) -> &str {
        VelocityModel::version(self)
    }

    fn config(&self) -> (String, usize) {
        VelocityModel::config(self)
    }
}

/// Holds a backend that may not be loaded yet.
#[derive(Debug)]
pub struct ModelSlot<B> {
    model: Option<B>,
}

impl<B> Default for ModelSlot<B> {
    fn default() -> Self {
        Self { model: None }
    }
}

impl<B: VelocityModelBackend> ModelSlot<B> {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a model into the slot. Fails if the slot is already loaded.
    pub fn initialize(
        &mut self,
        install_dir: &Path,
        label: &str,
        options: &LoadOptions,
    ) -> Result<()> {
        if self.model.is_some() {
            return Err(ModelError::AlreadyInitialized);
        }
        self.model = Some(B::initialize(install_dir, label, options)?);
        Ok(())
    }

    /// Place an already loaded model in the slot.
    pub fn insert(&mut self, model: B) -> Result<()> {
        if self.model.is_some() {
            return Err(ModelError::AlreadyInitialized);
        }
        self.model = Some(model);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// The loaded model.
    pub fn get(&self) -> Result<&B> {
        self.model.as_ref().ok_or(ModelError::NotInitialized)
    }

    pub fn query(&self, points: &[QueryPoint]) -> Result<Vec<PropertyTuple>> {
        self.get()?.query(points)
    }

    pub fn version(&self) -> Result<&str> {
        Ok(self.get()?.version())
    }

    pub fn config(&self) -> Result<(String, usize)> {
        Ok(self.get()?.config())
    }

    /// Release the loaded model and return the slot to the empty state.
    /// Finalizing an empty slot is a no-op.
    pub fn finalize(&mut self) -> Result<()> {
        match self.model.take() {
            Some(model) => model.finalize(),
            None => {
                warn!("Finalize called on an uninitialized model slot");
                Ok(())
            }
        }
    }
}
