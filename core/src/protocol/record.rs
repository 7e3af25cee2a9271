use serde::{Deserialize, Serialize};

/// Classification of a detected label against the configured category list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    /// Category index 0; the drowsy state.
    Fatigue,
    /// Any other configured category.
    Alert,
    Unknown,
}

/// Ordered category names, compared case-insensitively.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    names: Vec<String>,
}

impl CategoryMap {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Returns the category and, when known, the canonical spelling of the label.
    pub fn classify(&self, label: &str) -> (Category, Option<&str>) {
        match self
            .names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(label))
        {
            Some(0) => (Category::Fatigue, Some(self.names[0].as_str())),
            Some(idx) => (Category::Alert, Some(self.names[idx].as_str())),
            None => (Category::Unknown, None),
        }
    }
}

/// One decoded observation reported by the remote device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionRecord {
    pub label: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_locator: Option<String>,
    pub category: Category,
}

impl DetectionRecord {
    pub fn new(
        label: impl Into<String>,
        confidence: f64,
        stream_locator: Option<String>,
        category: Category,
    ) -> Self {
        Self {
            label: label.into(),
            confidence,
            stream_locator,
            category,
        }
    }

    pub fn is_fatigue(&self) -> bool {
        self.category == Category::Fatigue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_map() -> CategoryMap {
        CategoryMap::new(vec!["Close".into(), "Open".into()])
    }

    #[test]
    fn classify_ignores_case_and_returns_canonical_name() {
        let map = default_map();
        assert_eq!(map.classify("cLoSe"), (Category::Fatigue, Some("Close")));
        assert_eq!(map.classify("OPEN"), (Category::Alert, Some("Open")));
    }

    #[test]
    fn classify_unknown_label() {
        assert_eq!(default_map().classify("yawn"), (Category::Unknown, None));
    }
}
