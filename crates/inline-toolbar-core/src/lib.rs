pub mod document;
pub mod engine;
pub mod registry;
pub mod toolbar;

// Re-export key types for easier usage
pub use document::{Cmd, EMBED_UNITS, Line, LineContent, MemoryDocument, Patch};
pub use engine::{
    ChangeSource, DocumentEngine, EmbedData, EmbedType, EngineError, EngineEvent, LayoutQuery,
    LineDescriptor, LineId, LineKind, RowLayout, Selection, empty_data,
};
pub use registry::{
    Activation, EmbedBinder, EmbedButton, EmbedTrigger, ResolvedEmbed, ToolbarError,
    TriggerCallback,
};
pub use toolbar::{
    EmbeddableLine, InsertOutcome, SkipReason, ToolbarController, ToolbarPolicy, ToolbarState,
    TriggerTarget,
};
