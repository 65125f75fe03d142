/*!
 * # Document Engine Capability
 *
 * The toolbar never owns document content. Everything it knows about the
 * document comes through the [`DocumentEngine`] trait: the current selection,
 * the line under an offset, the total length, and the set of registered embed
 * types. Mutation is limited to two operations, inserting an embed and
 * appending an empty line.
 *
 * ## Offsets
 *
 * Offsets count *units*, not bytes. A text line of `n` characters occupies
 * `n + 1` units (the trailing line terminator is part of the line). An embed
 * placeholder counts as one unit. Engines differ on whether a block embed
 * carries its own terminator: `MemoryDocument` gives it one, so an embed line
 * there is two units long, while engines with bare block embeds report it as
 * a single unit, the same length as an empty text line.
 *
 * ## Events
 *
 * Engines report changes as [`EngineEvent`] values. Hosts hand each event to
 * `ToolbarController::handle_event`; nothing is registered globally.
 */

pub mod layout;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::EmbedTrigger;

pub use layout::{LayoutQuery, RowLayout};

/// Payload carried by an embed, e.g. `{"url": "cat.png"}`.
pub type EmbedData = serde_json::Value;

/// The payload used when an activation supplies no data.
pub fn empty_data() -> EmbedData {
    EmbedData::Object(serde_json::Map::new())
}

/// A range `[start, end)` over document units.
///
/// `start <= end` always holds. [`Selection::new`] and deserialization both
/// normalize reversed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawSelection")]
pub struct Selection {
    start: usize,
    end: usize,
}

#[derive(Deserialize)]
struct RawSelection {
    start: usize,
    end: usize,
}

impl From<RawSelection> for Selection {
    fn from(raw: RawSelection) -> Self {
        Self::new(raw.start, raw.end)
    }
}

impl Selection {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// A collapsed selection (caret) at `offset`
    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }
}

/// Stable identity of a line, assigned by the engine when the line is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(pub Uuid);

impl LineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    Text,
    Embed,
}

/// Snapshot of the line containing a queried offset. Not retained by the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDescriptor {
    pub id: LineId,
    /// Offset of the line's first unit
    pub start: usize,
    /// Units in the line, including the terminator or embed placeholder
    pub length: usize,
    pub kind: LineKind,
}

/// Where a text change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeSource {
    User,
    Api,
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SelectionChange(Option<Selection>),
    TextChange { source: ChangeSource },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown embed type: {0}")]
    InvalidEmbedType(String),
    #[error("Offset {offset} is out of range for document of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// A registered embed type as reported by the engine.
#[derive(Clone)]
pub struct EmbedType {
    pub key: String,
    /// External data collection run before insertion (file picker, URL prompt, ...)
    pub trigger: Option<Rc<dyn EmbedTrigger>>,
}

impl EmbedType {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            trigger: None,
        }
    }

    pub fn with_trigger(key: impl Into<String>, trigger: impl EmbedTrigger + 'static) -> Self {
        Self {
            key: key.into(),
            trigger: Some(Rc::new(trigger)),
        }
    }
}

impl fmt::Debug for EmbedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedType")
            .field("key", &self.key)
            .field("trigger", &self.trigger.is_some())
            .finish()
    }
}

/// The narrow surface the toolbar consumes from a rich-text document engine.
pub trait DocumentEngine {
    /// Current selection, `None` when the surface has no focus
    fn selection(&self) -> Option<Selection>;

    /// Replace the selection; `None` blurs the surface
    fn set_selection(&mut self, selection: Option<Selection>);

    /// Total length in units
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The line containing `offset`, or `None` when `offset >= len()`
    fn line_at(&self, offset: usize) -> Option<LineDescriptor>;

    fn insert_embed(&mut self, kind: &str, data: EmbedData, offset: usize)
    -> Result<(), EngineError>;

    /// Append one empty text line at the end of the document
    fn append_line(&mut self);

    /// Registered embed types, in registration order
    fn embed_types(&self) -> Vec<EmbedType>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_normalizes_reversed_range() {
        let selection = Selection::new(7, 3);
        assert_eq!(selection.start(), 3);
        assert_eq!(selection.end(), 7);
        assert_eq!(selection.len(), 4);
        assert!(!selection.is_collapsed());
    }

    #[test]
    fn test_deserialized_selection_is_normalized() {
        let selection: Selection = serde_json::from_str(r#"{"start": 7, "end": 3}"#).unwrap();
        assert_eq!(selection, Selection::new(3, 7));

        let json = serde_json::to_string(&selection).unwrap();
        assert_eq!(json, r#"{"start":3,"end":7}"#);
    }

    #[test]
    fn test_caret_is_collapsed() {
        let caret = Selection::caret(5);
        assert!(caret.is_collapsed());
        assert!(caret.is_empty());
        assert_eq!(caret, Selection::new(5, 5));
    }

    #[test]
    fn test_empty_data_is_empty_object() {
        assert_eq!(empty_data(), serde_json::json!({}));
    }

    #[test]
    fn test_line_ids_are_unique() {
        assert_ne!(LineId::new(), LineId::new());
    }

    #[test]
    fn test_engine_error_messages() {
        assert_eq!(
            EngineError::InvalidEmbedType("video".into()).to_string(),
            "Unknown embed type: video"
        );
        assert_eq!(
            EngineError::OffsetOutOfRange { offset: 9, len: 2 }.to_string(),
            "Offset 9 is out of range for document of length 2"
        );
    }
}
