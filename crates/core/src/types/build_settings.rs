use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const BUILT_PRODUCTS_DIR: &str = "BUILT_PRODUCTS_DIR";
pub const FULL_PRODUCT_NAME: &str = "FULL_PRODUCT_NAME";
pub const TEST_HOST: &str = "TEST_HOST";
pub const SDK_NAME: &str = "SDK_NAME";

/// Build settings of one target, in the order the build tool reported them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildSettings(IndexMap<String, String>);

impl BuildSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.0.insert(name, value);
    }

    /// Value of a setting, treating an empty value as unset
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }

    pub fn built_products_dir(&self) -> Option<PathBuf> {
        self.non_empty(BUILT_PRODUCTS_DIR).map(PathBuf::from)
    }

    pub fn full_product_name(&self) -> Option<&str> {
        self.non_empty(FULL_PRODUCT_NAME)
    }

    /// Host application of an application test bundle, if any
    pub fn test_host(&self) -> Option<PathBuf> {
        self.non_empty(TEST_HOST).map(PathBuf::from)
    }

    pub fn sdk_name(&self) -> Option<&str> {
        self.non_empty(SDK_NAME)
    }
}

impl<K, V> FromIterator<(K, V)> for BuildSettings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
