//! In-memory binding store implementing [`Lister`] and [`MutationSink`].
//!
//! Every successful mutation is appended to a call log so callers can check
//! what was dispatched and in which order. Failures can be injected per
//! binding name or for listing.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::dispatch::{Lister, MutationSink};
use crate::error::CollaboratorError;
use crate::types::RoleBinding;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("role binding {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("injected failure: {0}")]
    Injected(String),
}

/// A mutation that reached the store.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationCall {
    Update(RoleBinding),
    Delete { namespace: String, name: String },
}

impl MutationCall {
    pub fn name(&self) -> &str {
        match self {
            Self::Update(binding) => binding.name(),
            Self::Delete { name, .. } => name,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    /// (namespace, name) -> binding
    bindings: BTreeMap<(String, String), RoleBinding>,
    calls: Vec<MutationCall>,
    list_failure: Option<String>,
    mutation_failures: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bindings(bindings: impl IntoIterator<Item = RoleBinding>) -> Self {
        let store = Self::new();
        for binding in bindings {
            store.insert(binding);
        }
        store
    }

    pub fn insert(&self, binding: RoleBinding) {
        let key = (binding.namespace().to_string(), binding.name().to_string());
        self.state.lock().bindings.insert(key, binding);
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<RoleBinding> {
        self.state
            .lock()
            .bindings
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutations applied so far, oldest first.
    pub fn calls(&self) -> Vec<MutationCall> {
        self.state.lock().calls.clone()
    }

    pub fn fail_listing(&self, message: impl Into<String>) {
        self.state.lock().list_failure = Some(message.into());
    }

    /// Make any update or delete of `name` fail.
    pub fn fail_mutation_of(&self, name: impl Into<String>) {
        self.state.lock().mutation_failures.push(name.into());
    }
}

impl Lister for InMemoryStore {
    fn list(&self, namespace: &str) -> Result<Vec<RoleBinding>, CollaboratorError> {
        let state = self.state.lock();
        if let Some(message) = &state.list_failure {
            return Err(StoreError::Injected(message.clone()).into());
        }
        Ok(state
            .bindings
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, binding)| binding.clone())
            .collect())
    }
}

impl MutationSink for InMemoryStore {
    fn update(&self, binding: &RoleBinding) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock();
        if state.mutation_failures.iter().any(|n| n == binding.name()) {
            return Err(StoreError::Injected(format!("update {}", binding.name())).into());
        }
        let key = (binding.namespace().to_string(), binding.name().to_string());
        let slot = state.bindings.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            namespace: key.0.clone(),
            name: key.1.clone(),
        })?;
        *slot = binding.clone();
        state.calls.push(MutationCall::Update(binding.clone()));
        Ok(())
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock();
        if state.mutation_failures.iter().any(|n| n == name) {
            return Err(StoreError::Injected(format!("delete {name}")).into());
        }
        let key = (namespace.to_string(), name.to_string());
        if state.bindings.remove(&key).is_none() {
            return Err(StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
            .into());
        }
        state.calls.push(MutationCall::Delete {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }
}
