//! # Registration Publisher
//!
//! Publishes the discovered command surface to the platform's registration
//! API at startup. Building a single descriptor may fail and is skipped; a
//! rejection from the remote API aborts the whole publish, because a
//! partially registered surface must be visible to the operator.

use tracing::{debug, error, info};

use crate::application::registry::HandlerRegistry;
use crate::domain::error::PublishError;
use crate::domain::traits::RegistrationApi;

pub struct RegistrationPublisher;

impl RegistrationPublisher {
    pub fn new() -> Self {
        Self
    }

    /// Publishes every registered command. Returns the number of descriptors
    /// submitted, or the first remote rejection; descriptors submitted before
    /// the rejection stay registered remotely.
    pub async fn publish(
        &self,
        registry: &HandlerRegistry,
        api: &dyn RegistrationApi,
    ) -> Result<usize, PublishError> {
        info!("registering slash commands with the platform API");

        // Instantiate each handler once to obtain its descriptor. A failure
        // here skips that handler only.
        let mut descriptors = Vec::new();
        for entry in registry.entries().values() {
            match (entry.factory)(registry.context()) {
                Ok(command) => descriptors.push(command.descriptor()),
                Err(err) => {
                    error!("error building descriptor for command {}: {err:#}", entry.name);
                }
            }
        }

        // Submit one at a time, in map-iteration order. The first remote
        // failure aborts the publish.
        for descriptor in &descriptors {
            debug!("registering command: {}", descriptor.name);
            api.create_global_command(descriptor)
                .await
                .map_err(|source| PublishError::Remote {
                    command: descriptor.name.clone(),
                    source,
                })?;
        }

        info!("successfully registered {} slash commands", descriptors.len());
        Ok(descriptors.len())
    }
}

impl Default for RegistrationPublisher {
    fn default() -> Self {
        Self::new()
    }
}
