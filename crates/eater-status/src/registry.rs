//! The registry itself and its attribute type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::StatusError;

/// Callback producing the current value of an attribute.
pub type ShowFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Name of the process-wide registry.
const GLOBAL_NAME: &str = "entropy_eater";

/// A named attribute and the callback that renders it.
#[derive(Clone)]
pub struct StatusAttr {
    name: String,
    show: ShowFn,
}

impl StatusAttr {
    /// Create an attribute from a name and a rendering callback.
    pub fn new<F>(name: impl Into<String>, show: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            show: Arc::new(show),
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the callback and return the newline-terminated value.
    pub fn render(&self) -> String {
        terminate((self.show)())
    }
}

impl fmt::Debug for StatusAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusAttr").field("name", &self.name).finish_non_exhaustive()
    }
}

fn terminate(mut value: String) -> String {
    if !value.ends_with('\n') {
        value.push('\n');
    }
    value
}

fn validate_name(name: &str) -> Result<(), StatusError> {
    if name.is_empty() || name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(StatusError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// A directory of status attributes.
///
/// Cloning is cheap; all clones share the same attribute table.
#[derive(Clone)]
pub struct StatusRegistry {
    name: Arc<str>,
    attrs: Arc<RwLock<BTreeMap<String, StatusAttr>>>,
}

impl StatusRegistry {
    /// The process-wide registry, created on first use.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<StatusRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| Self::create(GLOBAL_NAME))
    }

    /// Create an independent registry.
    pub fn create(name: &str) -> Self {
        debug!(registry = name, "Status registry created");
        Self {
            name: Arc::from(name),
            attrs: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Tear the registry down. Every attribute must have been removed first.
    pub fn destroy(self) -> Result<(), StatusError> {
        let remaining = self.attrs.read().len();
        if remaining > 0 {
            return Err(StatusError::NotEmpty {
                registry: self.name.to_string(),
                remaining,
            });
        }
        debug!(registry = %self.name, "Status registry destroyed");
        Ok(())
    }

    /// Registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an attribute.
    pub fn register(&self, attr: StatusAttr) -> Result<(), StatusError> {
        validate_name(attr.name())?;
        let mut attrs = self.attrs.write();
        if attrs.contains_key(attr.name()) {
            return Err(StatusError::Duplicate {
                name: attr.name.clone(),
            });
        }
        debug!(registry = %self.name, attr = attr.name(), "Status attribute registered");
        attrs.insert(attr.name.clone(), attr);
        Ok(())
    }

    /// Remove an attribute.
    pub fn unregister(&self, name: &str) -> Result<(), StatusError> {
        if self.attrs.write().remove(name).is_none() {
            return Err(StatusError::Unknown {
                name: name.to_owned(),
            });
        }
        debug!(registry = %self.name, attr = name, "Status attribute unregistered");
        Ok(())
    }

    /// Add several attributes, all or nothing.
    ///
    /// On the first failure every attribute added by this call is removed
    /// again, in reverse order, and the failure is returned.
    pub fn register_many(&self, attrs: impl IntoIterator<Item = StatusAttr>) -> Result<(), StatusError> {
        let mut added: Vec<String> = Vec::new();
        for attr in attrs {
            let name = attr.name.clone();
            if let Err(e) = self.register(attr) {
                for done in added.iter().rev() {
                    if let Err(undo) = self.unregister(done) {
                        warn!(attr = done.as_str(), error = %undo, "Rollback failed");
                    }
                }
                return Err(e);
            }
            added.push(name);
        }
        Ok(())
    }

    /// Remove several attributes. Every name is attempted; the first
    /// failure, if any, is returned.
    pub fn unregister_many<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<(), StatusError> {
        let mut first_err = None;
        for name in names {
            if let Err(e) = self.unregister(name) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Whether an attribute is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.read().contains_key(name)
    }

    /// Read one attribute. Returns `None` if it is not registered.
    pub fn read(&self, name: &str) -> Option<String> {
        let attr = self.attrs.read().get(name).cloned()?;
        Some(attr.render())
    }

    /// Names of all registered attributes, sorted.
    pub fn names(&self) -> Vec<String> {
        self.attrs.read().keys().cloned().collect()
    }

    /// Read every attribute, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        let attrs: Vec<StatusAttr> = self.attrs.read().values().cloned().collect();
        attrs
            .into_iter()
            .map(|attr| {
                let value = attr.render();
                (attr.name, value)
            })
            .collect()
    }

    /// Number of registered attributes.
    pub fn len(&self) -> usize {
        self.attrs.read().len()
    }

    /// Whether the registry holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.attrs.read().is_empty()
    }
}

impl fmt::Debug for StatusRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusRegistry")
            .field("name", &self.name)
            .field("attrs", &self.names())
            .finish()
    }
}
