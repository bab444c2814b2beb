//! Compose panels: the comment boxes opened for an inline edit or for
//! rejecting a thread entry.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::EntryIndex;

/// Where a panel is attached. At most one panel exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "scope", content = "entry", rename_all = "snake_case")]
pub enum PanelKey {
    /// The annotation-level change-and-comment panel.
    Annotation,
    /// A rejection panel on one thread entry.
    Entry(EntryIndex),
}

/// Which part of an annotation an inline edit changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditTarget {
    Nl,
    Cmd,
}

impl EditTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nl => "nl",
            Self::Cmd => "cmd",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "nl" => Ok(Self::Nl),
            "cmd" => Ok(Self::Cmd),
            _ => Err(CoreError::Validation(format!(
                "Invalid edit target '{s}'. Must be one of: nl, cmd"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelKind {
    Rejection,
    ChangeAndComment { target: EditTarget },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposePanel {
    pub key: PanelKey,
    pub kind: PanelKind,
    pub placeholder: String,
}

/// Open compose panels of one annotation, in opening order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PanelSet {
    panels: Vec<ComposePanel>,
}

impl PanelSet {
    /// Open a panel, replacing any panel already open under the same key.
    /// Returns the replaced panel.
    pub fn open(&mut self, panel: ComposePanel) -> Option<ComposePanel> {
        let replaced = self.close(panel.key);
        self.panels.push(panel);
        replaced
    }

    pub fn close(&mut self, key: PanelKey) -> Option<ComposePanel> {
        let pos = self.panels.iter().position(|p| p.key == key)?;
        Some(self.panels.remove(pos))
    }

    pub fn get(&self, key: PanelKey) -> Option<&ComposePanel> {
        self.panels.iter().find(|p| p.key == key)
    }

    /// Like [`get`](Self::get) but a missing panel is a validation error.
    pub fn require(&self, key: PanelKey) -> Result<&ComposePanel, CoreError> {
        self.get(key).ok_or_else(|| {
            CoreError::Validation(match key {
                PanelKey::Annotation => "No edit panel is open".to_string(),
                PanelKey::Entry(index) => format!("No comment panel is open on entry {index}"),
            })
        })
    }

    pub fn is_open(&self, key: PanelKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComposePanel> {
        self.panels.iter()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(index: EntryIndex, placeholder: &str) -> ComposePanel {
        ComposePanel {
            key: PanelKey::Entry(index),
            kind: PanelKind::Rejection,
            placeholder: placeholder.to_string(),
        }
    }

    #[test]
    fn test_reopening_same_key_replaces_panel() {
        let mut panels = PanelSet::default();
        assert!(panels.open(rejection(3, "first")).is_none());
        let replaced = panels.open(rejection(3, "second")).unwrap();
        assert_eq!(replaced.placeholder, "first");
        assert_eq!(panels.len(), 1);
        assert_eq!(panels.get(PanelKey::Entry(3)).unwrap().placeholder, "second");
    }

    #[test]
    fn test_panels_on_different_keys_coexist() {
        let mut panels = PanelSet::default();
        panels.open(rejection(0, "a"));
        panels.open(rejection(1, "b"));
        panels.open(ComposePanel {
            key: PanelKey::Annotation,
            kind: PanelKind::ChangeAndComment {
                target: EditTarget::Nl,
            },
            placeholder: "c".to_string(),
        });
        assert_eq!(panels.len(), 3);
        assert!(panels.close(PanelKey::Entry(0)).is_some());
        assert!(!panels.is_open(PanelKey::Entry(0)));
        assert!(panels.is_open(PanelKey::Entry(1)));
    }

    #[test]
    fn test_require_missing_panel_is_validation_error() {
        let panels = PanelSet::default();
        assert!(matches!(
            panels.require(PanelKey::Entry(2)),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_edit_target_parse() {
        assert_eq!(EditTarget::from_str("nl").unwrap(), EditTarget::Nl);
        assert_eq!(EditTarget::from_str("cmd").unwrap(), EditTarget::Cmd);
        assert!(EditTarget::from_str("url").is_err());
    }
}
