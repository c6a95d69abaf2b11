//! Style registry for managing available filter styles.

use crate::execution::chain::{StageSpec, StyleChain};
use crate::filters::styles::{normalize_id, FilterStyle, StyleCategory};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Descriptive data of a style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleMetadata {
    /// Unique identifier (`ccd-classic`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Category for grouping.
    pub category: StyleCategory,
    /// Whether the style is part of the paid set.
    pub premium: bool,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Whether the style ships with the crate.
    #[serde(default)]
    pub builtin: bool,
}

impl From<FilterStyle> for StyleMetadata {
    fn from(style: FilterStyle) -> Self {
        Self {
            id: style.id().to_string(),
            name: style.display_name().to_string(),
            category: style.category(),
            premium: style.is_premium(),
            description: style.description().to_string(),
            builtin: true,
        }
    }
}

/// Registry entry containing metadata and the prebuilt chain.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Cached metadata.
    pub metadata: StyleMetadata,
    /// Operators, built once.
    pub chain: StyleChain,
}

/// Registry for all available styles.
///
/// Holds the built-in styles plus any custom styles, keyed by their
/// normalized id, in registration order.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: IndexMap<String, RegistryEntry>,
    seed: u64,
}

impl StyleRegistry {
    /// Create a new empty registry. `seed` feeds noise and grain stages.
    pub fn new(seed: u64) -> Self {
        Self {
            styles: IndexMap::new(),
            seed,
        }
    }

    /// Create a registry pre-populated with the built-in styles.
    pub fn with_builtins(seed: u64) -> Self {
        let mut registry = Self::new(seed);
        for style in FilterStyle::ALL {
            registry.register(StyleMetadata::from(style), style.stages());
        }
        registry
    }

    /// Register a style, replacing any style with the same id.
    ///
    /// Returns the replaced entry, if any.
    pub fn register(&mut self, mut metadata: StyleMetadata, stages: Vec<StageSpec>) -> Option<RegistryEntry> {
        metadata.id = normalize_id(&metadata.id);
        let id = metadata.id.clone();
        log::debug!("registering style '{}' ({} stages)", id, stages.len());
        let entry = RegistryEntry {
            chain: StyleChain::build(stages, self.seed),
            metadata,
        };
        self.styles.insert(id, entry)
    }

    /// Seed used when building chains.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get a registry entry. Ids are normalized before lookup.
    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.styles.get(&normalize_id(id))
    }

    /// Get the chain of a built-in style.
    pub fn chain(&self, style: FilterStyle) -> Option<&StyleChain> {
        self.styles.get(style.id()).map(|e| &e.chain)
    }

    /// Get metadata for a style.
    pub fn get_metadata(&self, id: &str) -> Option<&StyleMetadata> {
        self.get(id).map(|e| &e.metadata)
    }

    /// Check if a style is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get all registered style ids.
    pub fn style_ids(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(|s| s.as_str())
    }

    /// Get all registered styles' metadata, in registration order.
    pub fn metadata(&self) -> impl Iterator<Item = &StyleMetadata> {
        self.styles.values().map(|e| &e.metadata)
    }

    /// Get styles by category.
    pub fn styles_by_category(&self, category: &StyleCategory) -> Vec<&str> {
        self.styles
            .values()
            .filter(|e| &e.metadata.category == category)
            .map(|e| e.metadata.id.as_str())
            .collect()
    }

    /// Search styles by id, name or description.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.styles
            .iter()
            .filter(|(_, entry)| {
                let name_match = entry.metadata.name.to_lowercase().contains(&query);
                let desc_match = entry.metadata.description.to_lowercase().contains(&query);
                let id_match = entry.metadata.id.contains(&query);

                name_match || desc_match || id_match
            })
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Unregister a style.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.styles.shift_remove(&normalize_id(id)).is_some()
    }

    /// Get the total number of registered styles.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Get styles grouped by category for display, in registration order.
    pub fn grouped_by_category(&self) -> IndexMap<StyleCategory, Vec<&StyleMetadata>> {
        let mut grouped: IndexMap<StyleCategory, Vec<&StyleMetadata>> = IndexMap::new();

        for entry in self.styles.values() {
            grouped
                .entry(entry.metadata.category.clone())
                .or_default()
                .push(&entry.metadata);
        }

        grouped
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::with_builtins(crate::filters::builtin::DEFAULT_NOISE_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(id: &str) -> StyleMetadata {
        StyleMetadata {
            id: id.to_string(),
            name: "Sepia Dream".to_string(),
            category: StyleCategory::Custom,
            premium: false,
            description: "Warm monochrome".to_string(),
            builtin: false,
        }
    }

    #[test]
    fn test_builtins_registered_in_order() {
        let registry = StyleRegistry::default();
        assert_eq!(registry.len(), 13);
        let ids: Vec<_> = registry.style_ids().collect();
        assert_eq!(ids[0], "none");
        assert_eq!(ids[12], "lofi");
        assert!(registry.metadata().all(|m| m.builtin));
    }

    #[test]
    fn test_lookup_normalizes_ids() {
        let registry = StyleRegistry::default();
        assert!(registry.contains("CCD_Classic"));
        assert_eq!(registry.get_metadata("fuji_400h").unwrap().name, "Fuji 400H");
        assert_eq!(registry.chain(FilterStyle::Leica).unwrap().len(), 7);
        assert!(registry.get("polaroid").is_none());
    }

    #[test]
    fn test_register_custom() {
        let mut registry = StyleRegistry::default();
        let previous = registry.register(
            custom("Sepia_Dream"),
            vec![StageSpec::Monochrome, StageSpec::Gains { r: 1.1, g: 1.0, b: 0.85 }],
        );
        assert!(previous.is_none());
        assert!(registry.contains("sepia-dream"));
        assert_eq!(registry.get("sepia-dream").unwrap().chain.len(), 2);
        assert_eq!(registry.styles_by_category(&StyleCategory::Custom), vec!["sepia-dream"]);

        assert!(registry.register(custom("sepia-dream"), Vec::new()).is_some());
        assert_eq!(registry.len(), 14);
    }

    #[test]
    fn test_grouping() {
        let registry = StyleRegistry::default();
        let grouped = registry.grouped_by_category();
        let categories: Vec<_> = grouped.keys().cloned().collect();
        assert_eq!(
            categories,
            vec![StyleCategory::Original, StyleCategory::Ccd, StyleCategory::Film, StyleCategory::Vintage]
        );
        assert_eq!(grouped[&StyleCategory::Film].len(), 5);
    }

    #[test]
    fn test_search() {
        let registry = StyleRegistry::default();
        let results = registry.search("ccd");
        assert_eq!(results.len(), 4);
        assert!(registry.search("nonexistent").is_empty());
    }

    #[test]
    fn test_unregister() {
        let mut registry = StyleRegistry::default();
        assert!(registry.unregister("lofi"));
        assert!(!registry.contains("lofi"));
        assert!(!registry.unregister("lofi"));
    }
}
