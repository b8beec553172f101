//! Behavior modules selected by name.

use std::fmt;

use drift_core::ConfigError;
use drift_state::{BehaviorHook, HookError, NoBehavior};
use indexmap::IndexMap;

use crate::age::Age;
use crate::config::IbmConfig;
use crate::diel::Diel;
use crate::lifespan::Lifespan;
use crate::sinking::Sinking;

/// Builds a behavior module from its configuration.
pub type HookFactory = fn(&IbmConfig) -> Result<Box<dyn BehaviorHook>, HookError>;

/// Name-keyed table of behavior module factories.
#[derive(Clone, Default)]
pub struct IbmRegistry {
    factories: IndexMap<String, HookFactory>,
}

impl fmt::Debug for IbmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl IbmRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every module of this crate and `none`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("none", none);
        registry.register("age", age);
        registry.register("sinking", sinking);
        registry.register("lifespan", lifespan);
        registry.register("diel", diel);
        registry
    }

    /// Add or replace the factory for `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: HookFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the module named by `config`.
    ///
    /// # Errors
    ///
    /// [`HookError::Config`] if the name is unknown or the factory
    /// rejects the parameters.
    pub fn build(&self, config: &IbmConfig) -> Result<Box<dyn BehaviorHook>, HookError> {
        let factory = self.factories.get(&config.name).ok_or_else(|| {
            ConfigError::InvalidParameter {
                name: "ibm".into(),
                reason: format!(
                    "unknown behavior module '{}', expected one of: {}",
                    config.name,
                    self.names().collect::<Vec<_>>().join(", ")
                ),
            }
        })?;
        factory(config)
    }
}

fn none(_: &IbmConfig) -> Result<Box<dyn BehaviorHook>, HookError> {
    Ok(Box::new(NoBehavior))
}

fn age(config: &IbmConfig) -> Result<Box<dyn BehaviorHook>, HookError> {
    Ok(Box::new(Age::from_config(config)?))
}

fn sinking(config: &IbmConfig) -> Result<Box<dyn BehaviorHook>, HookError> {
    Ok(Box::new(Sinking::from_config(config)?))
}

fn lifespan(config: &IbmConfig) -> Result<Box<dyn BehaviorHook>, HookError> {
    Ok(Box::new(Lifespan::from_config(config)?))
}

fn diel(config: &IbmConfig) -> Result<Box<dyn BehaviorHook>, HookError> {
    Ok(Box::new(Diel::from_config(config)?))
}
