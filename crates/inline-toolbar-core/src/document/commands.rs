use crate::document::{EMBED_UNITS, Line, LineContent, MemoryDocument};
use crate::engine::{EmbedData, EngineError};

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Insert text at a caret; `\n` splits the line
    InsertText { at: usize, text: String },
    /// Remove the unit before `at`, joining lines at a line start
    DeleteBackward { at: usize },
    SplitLine { at: usize },
    InsertEmbed {
        at: usize,
        kind: String,
        data: EmbedData,
    },
    AppendLine,
}

impl Cmd {
    /// Offset the command is anchored at, `None` for end-of-document commands
    pub fn offset(&self) -> Option<usize> {
        match self {
            Cmd::InsertText { at, .. }
            | Cmd::DeleteBackward { at }
            | Cmd::SplitLine { at }
            | Cmd::InsertEmbed { at, .. } => Some(*at),
            Cmd::AppendLine => None,
        }
    }
}

/// What a command did to the line table
#[derive(Debug)]
pub(crate) struct Edit {
    pub changed_lines: std::ops::Range<usize>,
    pub delta: isize,
    pub caret: Option<usize>,
}

pub(crate) fn apply_command(doc: &mut MemoryDocument, cmd: &Cmd) -> Result<Edit, EngineError> {
    match cmd {
        Cmd::InsertText { at, text } => insert_text(doc, *at, text),
        Cmd::DeleteBackward { at } => delete_backward(doc, *at),
        Cmd::SplitLine { at } => {
            let (index, start) = locate(doc, *at)?;
            split_at(&mut doc.lines, index, *at - start);
            Ok(Edit {
                changed_lines: index..index + 2,
                delta: 1,
                caret: Some(*at + 1),
            })
        }
        Cmd::InsertEmbed { at, kind, data } => insert_embed(doc, *at, kind, data),
        Cmd::AppendLine => Ok(append_line(doc)),
    }
}

pub(crate) fn append_line(doc: &mut MemoryDocument) -> Edit {
    let index = doc.lines.len();
    doc.lines.push(Line::text(""));
    Edit {
        changed_lines: index..index + 1,
        delta: 1,
        caret: None,
    }
}

fn locate(doc: &MemoryDocument, offset: usize) -> Result<(usize, usize), EngineError> {
    doc.locate(offset).ok_or(EngineError::OffsetOutOfRange {
        offset,
        len: doc.len(),
    })
}

fn insert_text(doc: &mut MemoryDocument, at: usize, text: &str) -> Result<Edit, EngineError> {
    let (first_line, _) = locate(doc, at)?;
    let len_before = doc.len();
    let mut caret = at;
    let mut last_line = first_line;

    for ch in text.chars() {
        let (index, start) = locate(doc, caret)?;
        let local = caret - start;
        let (line, advance) = if ch == '\n' {
            split_at(&mut doc.lines, index, local);
            (index + 1, 1)
        } else {
            insert_char(&mut doc.lines, index, local, ch)
        };
        last_line = last_line.max(line);
        caret += advance;
    }

    Ok(Edit {
        changed_lines: first_line..last_line + 1,
        delta: doc.len() as isize - len_before as isize,
        caret: Some(caret),
    })
}

/// Returns the line the character landed on and how far the caret moves
fn insert_char(lines: &mut Vec<Line>, index: usize, local: usize, ch: char) -> (usize, usize) {
    // Typing on an embed starts a fresh text line on the caret's side of it
    if lines[index].is_embed() {
        return if local == 0 {
            lines.insert(index, Line::text(ch.to_string()));
            (index, 1)
        } else {
            lines.insert(index + 1, Line::text(ch.to_string()));
            (index + 1, 2)
        };
    }

    if let LineContent::Text(text) = &mut lines[index].content {
        let byte = byte_index(text, local);
        text.insert(byte, ch);
    }
    (index, 1)
}

/// Break the line at `local`. At an embed, an empty line opens on the caret's side.
fn split_at(lines: &mut Vec<Line>, index: usize, local: usize) {
    let (position, new_line) = match &mut lines[index].content {
        LineContent::Text(text) => {
            let byte = byte_index(text, local);
            let tail = text.split_off(byte);
            (index + 1, Line::text(tail))
        }
        LineContent::Embed { .. } if local == 0 => (index, Line::text("")),
        LineContent::Embed { .. } => (index + 1, Line::text("")),
    };
    lines.insert(position, new_line);
}

fn delete_backward(doc: &mut MemoryDocument, at: usize) -> Result<Edit, EngineError> {
    if at == 0 {
        return Ok(Edit {
            changed_lines: 0..1,
            delta: 0,
            caret: Some(0),
        });
    }

    let (index, start) = locate(doc, at)?;
    let local = at - start;

    let embed_units = EMBED_UNITS as isize;

    if local > 0 {
        // The unit before the caret is this embed's placeholder
        if doc.lines[index].is_embed() {
            let delta = if doc.lines.len() == 1 {
                doc.lines[index] = Line::text("");
                1 - embed_units
            } else {
                doc.lines.remove(index);
                -embed_units
            };
            return Ok(Edit {
                changed_lines: index..index + 1,
                delta,
                caret: Some(start),
            });
        }
        if let LineContent::Text(text) = &mut doc.lines[index].content {
            let byte = byte_index(text, local - 1);
            text.remove(byte);
        }
        return Ok(Edit {
            changed_lines: index..index + 1,
            delta: -1,
            caret: Some(at - 1),
        });
    }

    let prev = index - 1;

    if doc.lines[prev].is_embed() {
        doc.lines.remove(prev);
        return Ok(Edit {
            changed_lines: prev..prev + 1,
            delta: -embed_units,
            caret: Some(at - EMBED_UNITS),
        });
    }

    if doc.lines[index].is_embed() {
        doc.lines.remove(index);
        return Ok(Edit {
            changed_lines: prev..prev + 1,
            delta: -embed_units,
            caret: Some(at - 1),
        });
    }

    let current = doc.lines.remove(index);
    if let (LineContent::Text(prev_text), LineContent::Text(current_text)) =
        (&mut doc.lines[prev].content, current.content)
    {
        prev_text.push_str(&current_text);
    }

    Ok(Edit {
        changed_lines: prev..prev + 1,
        delta: -1,
        caret: Some(at - 1),
    })
}

enum Placement {
    /// The line is an empty text line and becomes the embed
    Replace,
    Before,
    After,
    Split,
}

fn insert_embed(
    doc: &mut MemoryDocument,
    at: usize,
    kind: &str,
    data: &EmbedData,
) -> Result<Edit, EngineError> {
    if !doc.has_embed_type(kind) {
        return Err(EngineError::InvalidEmbedType(kind.to_string()));
    }

    let (index, start) = locate(doc, at)?;
    let local = at - start;

    let placement = match &doc.lines[index].content {
        LineContent::Text(text) if text.is_empty() => Placement::Replace,
        LineContent::Text(text) if local == text.chars().count() => Placement::After,
        LineContent::Text(_) if local > 0 => Placement::Split,
        LineContent::Embed { .. } if local > 0 => Placement::After,
        _ => Placement::Before,
    };

    let embed = Line::embed(kind, data.clone());
    let units = EMBED_UNITS as isize;
    let (changed_lines, delta, embed_offset) = match placement {
        // The empty line's terminator becomes the embed's terminator
        Placement::Replace => {
            doc.lines[index] = embed;
            (index..index + 1, units - 1, at)
        }
        Placement::Before => {
            doc.lines.insert(index, embed);
            (index..index + 1, units, at)
        }
        Placement::After => {
            doc.lines.insert(index + 1, embed);
            (index + 1..index + 2, units, at + 1)
        }
        Placement::Split => {
            split_at(&mut doc.lines, index, local);
            doc.lines.insert(index + 1, embed);
            (index..index + 3, units + 1, at + 1)
        }
    };

    Ok(Edit {
        changed_lines,
        delta,
        caret: Some(embed_offset + 1),
    })
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(i, _)| i)
}
