//! # Registry
//!
//! Case-insensitive jurisdiction→adapter lookup (spec §4.2).

use crate::adapter::Adapter;
use crate::errors::{CoreError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
pub struct Registry {
    adapters: BTreeMap<String, Arc<dyn Adapter>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its lowercased jurisdiction code.
    /// Duplicate registration of the same code is rejected.
    pub fn register(&mut self, adapter: Arc<dyn Adapter>) -> Result<()> {
        let code = adapter.descriptor().jurisdiction_code.to_lowercase();
        if self.adapters.contains_key(&code) {
            return Err(CoreError::DuplicateCountry { code });
        }
        self.adapters.insert(code, adapter);
        Ok(())
    }

    /// Case-insensitive lookup.
    pub fn get(&self, code: &str) -> Result<Arc<dyn Adapter>> {
        self.adapters
            .get(&code.to_lowercase())
            .cloned()
            .ok_or_else(|| CoreError::UnknownCountry {
                code: code.to_string(),
            })
    }

    /// Returns all registered adapters ordered by lowercase code.
    pub fn list(&self) -> Vec<Arc<dyn Adapter>> {
        self.adapters.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CitationOnlyAdapter;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = Registry::new();
        registry
            .register(Arc::new(CitationOnlyAdapter::swedish()))
            .unwrap();
        assert!(registry.get("SE").is_ok());
        assert!(registry.get("se").is_ok());
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry
            .register(Arc::new(CitationOnlyAdapter::swedish()))
            .unwrap();
        let result = registry.register(Arc::new(CitationOnlyAdapter::swedish()));
        assert!(matches!(result, Err(CoreError::DuplicateCountry { .. })));
    }

    #[test]
    fn unknown_code_is_an_error() {
        let registry = Registry::new();
        assert!(matches!(
            registry.get("xx"),
            Err(CoreError::UnknownCountry { .. })
        ));
    }

    #[test]
    fn list_orders_by_lowercase_code() {
        let mut registry = Registry::new();
        registry
            .register(Arc::new(CitationOnlyAdapter::swedish()))
            .unwrap();
        registry
            .register(Arc::new(CitationOnlyAdapter::norwegian()))
            .unwrap();
        let codes: Vec<String> = registry
            .list()
            .iter()
            .map(|a| a.descriptor().jurisdiction_code.clone())
            .collect();
        assert_eq!(codes, vec!["no".to_string(), "se".to_string()]);
    }
}
