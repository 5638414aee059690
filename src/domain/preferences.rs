use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Key the preferences blob is persisted under.
pub const PREFERENCES_KEY: &str = "BrowseForwardPreferences";

/// User-selected category filters for the discovery feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsePreferences {
    #[serde(default)]
    pub selected_categories: BTreeSet<String>,
    #[serde(default)]
    pub selected_subcategories: BTreeMap<String, BTreeSet<String>>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl Default for BrowsePreferences {
    fn default() -> Self {
        Self {
            selected_categories: BTreeSet::new(),
            selected_subcategories: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

/// A category (and optional subcategory) to draw the next pool from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedTarget {
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl FeedTarget {
    pub fn all() -> Self {
        Self {
            category: None,
            subcategory: None,
        }
    }

    /// Cache label for this target.
    pub fn cache_key(&self) -> String {
        match (&self.category, &self.subcategory) {
            (None, _) => "*".to_string(),
            (Some(c), None) => c.clone(),
            (Some(c), Some(s)) => format!("{}/{}", c, s),
        }
    }
}

impl BrowsePreferences {
    /// No categories selected: draw from all active content.
    pub fn is_default_mode(&self) -> bool {
        self.selected_categories.is_empty()
    }

    pub fn select_category(&mut self, category: impl Into<String>) {
        self.selected_categories.insert(category.into());
        self.last_updated = Utc::now();
    }

    pub fn select_subcategory(&mut self, category: &str, subcategory: impl Into<String>) {
        self.selected_categories.insert(category.to_string());
        self.selected_subcategories
            .entry(category.to_string())
            .or_default()
            .insert(subcategory.into());
        self.last_updated = Utc::now();
    }

    pub fn remove_category(&mut self, category: &str) -> bool {
        let removed = self.selected_categories.remove(category);
        self.selected_subcategories.remove(category);
        if removed {
            self.last_updated = Utc::now();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.selected_categories.clear();
        self.selected_subcategories.clear();
        self.last_updated = Utc::now();
    }

    /// Pick one selected category at random, plus one of its subcategories if any.
    pub fn pick_target<R: Rng + ?Sized>(&self, rng: &mut R) -> FeedTarget {
        let Some(category) = self.selected_categories.iter().choose(rng) else {
            return FeedTarget::all();
        };

        let subcategory = self
            .selected_subcategories
            .get(category)
            .and_then(|subs| subs.iter().choose(rng))
            .cloned();

        FeedTarget {
            category: Some(category.clone()),
            subcategory,
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_mode_targets_everything() {
        let prefs = BrowsePreferences::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(prefs.is_default_mode());
        assert_eq!(prefs.pick_target(&mut rng), FeedTarget::all());
    }

    #[test]
    fn test_pick_target_uses_selected_subcategory() {
        let mut prefs = BrowsePreferences::default();
        prefs.select_subcategory("Science", "Space");
        let mut rng = StdRng::seed_from_u64(7);
        let target = prefs.pick_target(&mut rng);
        assert_eq!(target.category.as_deref(), Some("Science"));
        assert_eq!(target.subcategory.as_deref(), Some("Space"));
        assert_eq!(target.cache_key(), "Science/Space");
    }

    #[test]
    fn test_pick_target_only_from_selection() {
        let mut prefs = BrowsePreferences::default();
        prefs.select_category("News");
        prefs.select_category("Culture");
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let target = prefs.pick_target(&mut rng);
            let category = target.category.unwrap();
            assert!(category == "News" || category == "Culture");
            assert_eq!(target.subcategory, None);
        }
    }

    #[test]
    fn test_bytes_round_trip_with_camel_case_keys() {
        let mut prefs = BrowsePreferences::default();
        prefs.select_subcategory("Science", "Space");
        let bytes = prefs.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("selectedCategories"));
        assert_eq!(BrowsePreferences::from_bytes(&bytes).unwrap(), prefs);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let prefs = BrowsePreferences::from_bytes(br#"{"selectedCategories":["News"]}"#).unwrap();
        assert!(prefs.selected_subcategories.is_empty());
        assert!(!prefs.is_default_mode());
    }

    #[test]
    fn test_remove_category_drops_subcategories() {
        let mut prefs = BrowsePreferences::default();
        prefs.select_subcategory("Science", "Space");
        assert!(prefs.remove_category("Science"));
        assert!(!prefs.remove_category("Science"));
        assert!(prefs.selected_subcategories.is_empty());
        assert!(prefs.is_default_mode());
    }
}
