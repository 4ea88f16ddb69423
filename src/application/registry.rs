//! # Handler Registry
//!
//! Discovers command implementations from registration sources and resolves
//! them by name. Discovery instantiates each registration once, purely to
//! read its descriptor; the instance is discarded and handlers are
//! constructed fresh per invocation by the dispatcher.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::domain::traits::{ConsentStore, SessionStatus, SlashCommand};

/// Shared collaborators handed to command factories at construction time.
/// This is the whole dependency surface a command may draw from.
#[derive(Clone)]
pub struct HandlerContext {
    pub status: Arc<dyn SessionStatus>,
    pub consent: Arc<dyn ConsentStore>,
}

/// Constructs one command implementation from the shared context.
pub type CommandFactory =
    Arc<dyn Fn(&HandlerContext) -> Result<Box<dyn SlashCommand>> + Send + Sync>;

/// Name and description attached statically to a registration, readable
/// without constructing the command.
#[derive(Debug, Clone, Copy)]
pub struct CommandMetadata {
    pub name: &'static str,
    pub description: &'static str,
}

/// One registered command implementation: the factory plus optional static
/// metadata for instantiation-free discovery.
#[derive(Clone)]
pub struct Registration {
    pub type_name: &'static str,
    pub metadata: Option<CommandMetadata>,
    pub factory: CommandFactory,
}

impl Registration {
    pub fn new(type_name: &'static str, factory: CommandFactory) -> Self {
        Self {
            type_name,
            metadata: None,
            factory,
        }
    }

    pub fn with_metadata(
        type_name: &'static str,
        metadata: CommandMetadata,
        factory: CommandFactory,
    ) -> Self {
        Self {
            type_name,
            metadata: Some(metadata),
            factory,
        }
    }
}

/// A loadable set of registrations. Enumeration itself may fail (e.g. a
/// registration list built from external input); discovery treats that as a
/// recoverable scan failure.
pub trait CommandSource: Send + Sync {
    fn load(&self) -> Result<Vec<Registration>>;
}

impl CommandSource for Vec<Registration> {
    fn load(&self) -> Result<Vec<Registration>> {
        Ok(self.clone())
    }
}

/// Resolved entry in the registry map.
#[derive(Clone)]
pub struct HandlerEntry {
    pub name: String,
    pub factory: CommandFactory,
}

/// Name -> implementation map over all discovered commands. Built once at
/// startup, read-only afterwards; lookups are case-insensitive and
/// collisions resolve last-registration-wins.
pub struct HandlerRegistry {
    context: HandlerContext,
    entries: BTreeMap<String, HandlerEntry>,
}

impl HandlerRegistry {
    pub fn new(context: HandlerContext) -> Self {
        Self {
            context,
            entries: BTreeMap::new(),
        }
    }

    /// Scans one registration source. Each registration is instantiated once
    /// to read its descriptor; the descriptor's name becomes the map key, so
    /// an implementation that overrides its descriptor wins over its static
    /// metadata. A factory failure skips that entry; a failure to enumerate
    /// the source yields an empty map. Neither ever blocks startup.
    pub fn discover(&self, source: &dyn CommandSource) -> BTreeMap<String, HandlerEntry> {
        info!("scanning for command implementations");

        let registrations = match source.load() {
            Ok(registrations) => registrations,
            Err(err) => {
                error!("failed to enumerate command source: {err:#}");
                return BTreeMap::new();
            }
        };

        let mut map = BTreeMap::new();
        for registration in registrations {
            match (registration.factory)(&self.context) {
                Ok(command) => {
                    let name = command.descriptor().name;
                    debug!("registered command: {} -> {}", name, registration.type_name);
                    map.insert(
                        name.clone(),
                        HandlerEntry {
                            name,
                            factory: registration.factory.clone(),
                        },
                    );
                }
                Err(err) => {
                    warn!(
                        "could not construct command {}: {err:#}",
                        registration.type_name
                    );
                }
            }
        }

        info!("found {} command implementations", map.len());
        map
    }

    /// Instantiation-free discovery: reads the static metadata attached to
    /// each registration. Used when constructing handlers just to read their
    /// names is undesirable. Registrations without metadata are skipped with
    /// a warning.
    pub fn discover_by_metadata(&self, source: &dyn CommandSource) -> BTreeMap<String, HandlerEntry> {
        info!("scanning for command implementations via metadata");

        let registrations = match source.load() {
            Ok(registrations) => registrations,
            Err(err) => {
                error!("failed to enumerate command source: {err:#}");
                return BTreeMap::new();
            }
        };

        let mut map = BTreeMap::new();
        for registration in registrations {
            match registration.metadata {
                Some(metadata) => {
                    let name = metadata.name.to_lowercase();
                    debug!(
                        "registered command via metadata: {} -> {}",
                        name, registration.type_name
                    );
                    map.insert(
                        name.clone(),
                        HandlerEntry {
                            name,
                            factory: registration.factory.clone(),
                        },
                    );
                }
                None => {
                    warn!(
                        "command {} has no static metadata, skipping",
                        registration.type_name
                    );
                }
            }
        }

        info!("found {} command implementations via metadata", map.len());
        map
    }

    /// Discovers over multiple sources in input order, merging by union.
    /// Later sources overwrite earlier ones on name collision.
    pub fn discover_all(&mut self, sources: &[&dyn CommandSource]) {
        for source in sources {
            let found = self.discover(*source);
            self.entries.extend(found);
        }
    }

    /// Case-insensitive lookup.
    pub fn resolve(&self, name: &str) -> Option<&HandlerEntry> {
        self.entries.get(&name.to_lowercase())
    }

    pub fn entries(&self) -> &BTreeMap<String, HandlerEntry> {
        &self.entries
    }

    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
