/*!
 * # Reference Document Engine
 *
 * [`MemoryDocument`] is a small line-based implementation of
 * [`DocumentEngine`]. Hosts with a real rich-text engine implement the trait
 * themselves; this one backs the tests, the benchmark and the terminal
 * surface.
 *
 * The document is a list of [`Line`]s, each either text or a single embed.
 * A text line occupies its characters plus a terminator; an embed line
 * occupies its placeholder plus a terminator, so only an empty text line
 * has length 1.
 * Edits go through [`Cmd`] and return a [`Patch`]. Every edit and selection
 * change queues an [`EngineEvent`] that the host drains with
 * [`MemoryDocument::take_event`] and forwards to the toolbar.
 */

pub mod commands;
pub mod patch;

use std::collections::VecDeque;
use std::fmt;

use crate::engine::{
    ChangeSource, DocumentEngine, EmbedData, EmbedType, EngineError, EngineEvent, LineDescriptor,
    LineId, LineKind, Selection,
};

pub use commands::Cmd;
pub use patch::Patch;

/// Units held by an embed line: the placeholder and the line terminator
pub const EMBED_UNITS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum LineContent {
    Text(String),
    Embed { kind: String, data: EmbedData },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: LineId,
    pub content: LineContent,
}

impl Line {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: LineId::new(),
            content: LineContent::Text(text.into()),
        }
    }

    pub fn embed(kind: impl Into<String>, data: EmbedData) -> Self {
        Self {
            id: LineId::new(),
            content: LineContent::Embed {
                kind: kind.into(),
                data,
            },
        }
    }

    /// Units occupied by the line, terminator included
    pub fn units(&self) -> usize {
        match &self.content {
            LineContent::Text(text) => text.chars().count() + 1,
            LineContent::Embed { .. } => EMBED_UNITS,
        }
    }

    pub fn kind(&self) -> LineKind {
        match self.content {
            LineContent::Text(_) => LineKind::Text,
            LineContent::Embed { .. } => LineKind::Embed,
        }
    }

    pub fn is_embed(&self) -> bool {
        self.kind() == LineKind::Embed
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            LineContent::Text(text) => Some(text),
            LineContent::Embed { .. } => None,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            LineContent::Text(text) => write!(f, "{text:?}"),
            LineContent::Embed { kind, data } => write!(f, "[{kind} {data}]"),
        }
    }
}

pub struct MemoryDocument {
    pub(crate) lines: Vec<Line>,
    pub(crate) selection: Option<Selection>,
    pub(crate) embed_types: Vec<EmbedType>,
    pub(crate) events: VecDeque<EngineEvent>,
    pub(crate) version: u64,
}

impl MemoryDocument {
    /// A document holding a single empty line
    pub fn new() -> Self {
        Self::from_lines(Vec::new())
    }

    /// Build from plain text, one line per `\n`-separated segment
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n').map(Line::text).collect())
    }

    pub fn from_lines(mut lines: Vec<Line>) -> Self {
        if lines.is_empty() {
            lines.push(Line::text(""));
        }
        Self {
            lines,
            selection: None,
            embed_types: Vec::new(),
            events: VecDeque::new(),
            version: 0,
        }
    }

    pub fn with_embed_type(mut self, embed_type: EmbedType) -> Self {
        self.register_embed_type(embed_type);
        self
    }

    /// Register an embed type; re-registering a key replaces it in place
    pub fn register_embed_type(&mut self, embed_type: EmbedType) {
        match self
            .embed_types
            .iter_mut()
            .find(|existing| existing.key == embed_type.key)
        {
            Some(existing) => *existing = embed_type,
            None => self.embed_types.push(embed_type),
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        self.lines.iter().map(|line| line.id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.lines.iter().map(Line::units).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a user edit. The caret moves to where the command leaves it.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EngineError> {
        self.apply_with_source(cmd, ChangeSource::User)
    }

    pub fn apply_with_source(
        &mut self,
        cmd: Cmd,
        source: ChangeSource,
    ) -> Result<Patch, EngineError> {
        let at = cmd.offset().unwrap_or_else(|| self.len());
        let edit = commands::apply_command(self, &cmd)?;
        Ok(self.record_edit(edit, at, source))
    }

    /// Next queued event, oldest first
    pub fn take_event(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    /// Line index and start offset of the line containing `offset`
    pub(crate) fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (index, line) in self.lines.iter().enumerate() {
            let end = start + line.units();
            if offset < end {
                return Some((index, start));
            }
            start = end;
        }
        None
    }

    pub(crate) fn has_embed_type(&self, kind: &str) -> bool {
        self.embed_types.iter().any(|embed| embed.key == kind)
    }

    fn record_edit(&mut self, edit: commands::Edit, at: usize, source: ChangeSource) -> Patch {
        self.version += 1;
        self.events.push_back(EngineEvent::TextChange { source });

        let selection = match (source, edit.caret) {
            (ChangeSource::User, Some(caret)) => Some(Selection::caret(caret)),
            _ => self
                .selection
                .map(|selection| shift_selection(selection, at, edit.delta)),
        };
        self.update_selection(selection);

        Patch {
            changed_lines: edit.changed_lines,
            at,
            delta: edit.delta,
            caret: edit.caret,
            version: self.version,
        }
    }

    fn update_selection(&mut self, selection: Option<Selection>) {
        let selection = selection.map(|selection| self.clamp(selection));
        if selection != self.selection {
            self.selection = selection;
            self.events
                .push_back(EngineEvent::SelectionChange(selection));
        }
    }

    fn clamp(&self, selection: Selection) -> Selection {
        let max = self.len().saturating_sub(1);
        Selection::new(selection.start().min(max), selection.end().min(max))
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("lines", &self.lines)
            .field("selection", &self.selection)
            .field("embed_types", &self.embed_types)
            .field("version", &self.version)
            .finish()
    }
}

impl fmt::Display for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

fn shift_selection(selection: Selection, at: usize, delta: isize) -> Selection {
    let shift = |offset: usize| {
        if offset < at {
            offset
        } else {
            offset.saturating_add_signed(delta)
        }
    };
    Selection::new(shift(selection.start()), shift(selection.end()))
}

impl DocumentEngine for MemoryDocument {
    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.update_selection(selection);
    }

    fn len(&self) -> usize {
        MemoryDocument::len(self)
    }

    fn line_at(&self, offset: usize) -> Option<LineDescriptor> {
        let (index, start) = self.locate(offset)?;
        let line = &self.lines[index];
        Some(LineDescriptor {
            id: line.id,
            start,
            length: line.units(),
            kind: line.kind(),
        })
    }

    fn insert_embed(
        &mut self,
        kind: &str,
        data: EmbedData,
        offset: usize,
    ) -> Result<(), EngineError> {
        self.apply_with_source(
            Cmd::InsertEmbed {
                at: offset,
                kind: kind.to_string(),
                data,
            },
            ChangeSource::Api,
        )
        .map(|_| ())
    }

    fn append_line(&mut self) {
        let at = MemoryDocument::len(self);
        let edit = commands::append_line(self);
        self.record_edit(edit, at, ChangeSource::Api);
    }

    fn embed_types(&self) -> Vec<EmbedType> {
        self.embed_types.clone()
    }
}
