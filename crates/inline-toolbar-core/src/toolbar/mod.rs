/*!
 * # Contextual Toolbar Controller
 *
 * [`ToolbarController`] turns selection and line state into a toolbar
 * visibility state and performs embed insertion.
 *
 * ## States
 *
 * - **Hidden**: nothing shown. Initial state.
 * - **PositionedInline**: the small anchor control is shown beside an empty
 *   line. Entered by [`ToolbarController::recompute`] whenever the caret is
 *   collapsed on a line of sentinel length.
 * - **ExpandedPicker**: the embed picker is open at the same position.
 *   Entered only through [`ToolbarController::expand`].
 *
 * Recompute runs for every engine event. A null selection, a range, or a
 * non-sentinel line hides the toolbar. The one exception is a null selection
 * while the picker is open: expanding blurs the document on purpose, so the
 * blur it causes does not close the picker.
 *
 * ## Insertion
 *
 * [`ToolbarController::insert_embed`] inserts at the recorded index, hides
 * the toolbar, and appends an empty line when the insertion happened on the
 * document's last unit so there is always somewhere to keep typing.
 */

pub mod insertion;
pub mod policy;

use crate::engine::{DocumentEngine, EmbedData, EngineError, EngineEvent, LayoutQuery};

pub use insertion::{InsertOutcome, SkipReason};
pub use policy::{EmbeddableLine, SENTINEL_LINE_LENGTH, ToolbarPolicy, TriggerTarget};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToolbarState {
    #[default]
    Hidden,
    PositionedInline {
        top: f32,
    },
    ExpandedPicker {
        top: f32,
    },
}

impl ToolbarState {
    pub fn is_visible(&self) -> bool {
        !matches!(self, ToolbarState::Hidden)
    }

    /// Anchor top offset while visible
    pub fn top(&self) -> Option<f32> {
        match self {
            ToolbarState::Hidden => None,
            ToolbarState::PositionedInline { top } | ToolbarState::ExpandedPicker { top } => {
                Some(*top)
            }
        }
    }
}

pub struct ToolbarController<E, L> {
    engine: E,
    layout: L,
    policy: ToolbarPolicy,
    state: ToolbarState,
    last_index: Option<usize>,
}

impl<E, L> ToolbarController<E, L>
where
    E: DocumentEngine,
    L: LayoutQuery,
{
    pub fn new(engine: E, layout: L) -> Self {
        Self {
            engine,
            layout,
            policy: ToolbarPolicy::default(),
            state: ToolbarState::Hidden,
            last_index: None,
        }
    }

    pub fn with_policy(mut self, policy: ToolbarPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ToolbarPolicy {
        self.policy
    }

    pub fn state(&self) -> ToolbarState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    pub fn anchor_top(&self) -> Option<f32> {
        self.state.top()
    }

    /// Index the next insertion targets; `None` while hidden
    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    /// Dispatch an engine event. Both event kinds recompute from the engine's
    /// current selection rather than the payload.
    pub fn handle_event(&mut self, event: &EngineEvent) -> ToolbarState {
        log::trace!("toolbar event: {event:?}");
        self.recompute()
    }

    pub fn recompute(&mut self) -> ToolbarState {
        let Some(selection) = self.engine.selection() else {
            if !matches!(self.state, ToolbarState::ExpandedPicker { .. }) {
                self.close();
            }
            return self.state;
        };

        if !selection.is_collapsed() {
            self.close();
            return self.state;
        }

        match self.engine.line_at(selection.start()) {
            Some(line) if self.policy.embeddable_line.accepts(&line) => {
                let top = self.layout.measure_line_top(line.id);
                self.last_index = Some(selection.start());
                self.transition(ToolbarState::PositionedInline { top });
            }
            _ => self.close(),
        }
        self.state
    }

    /// Open the picker from the anchor. Returns `false` unless positioned.
    pub fn expand(&mut self) -> bool {
        let ToolbarState::PositionedInline { top } = self.state else {
            return false;
        };
        self.transition(ToolbarState::ExpandedPicker { top });
        self.engine.set_selection(None);
        true
    }

    /// Hide the toolbar and forget the insertion index
    pub fn close(&mut self) {
        self.last_index = None;
        self.transition(ToolbarState::Hidden);
    }

    /// Insert an embed at the recorded index.
    ///
    /// A missing or out-of-range index is a silent no-op. Engine failures are
    /// returned as-is and leave the toolbar state untouched.
    pub fn insert_embed(
        &mut self,
        kind: &str,
        data: EmbedData,
    ) -> Result<InsertOutcome, EngineError> {
        self.insert_embed_at(self.last_index, kind, data)
    }

    /// Insert an embed at an explicit target, with the same tail policy as
    /// [`Self::insert_embed`].
    pub fn insert_embed_at(
        &mut self,
        target: Option<usize>,
        kind: &str,
        data: EmbedData,
    ) -> Result<InsertOutcome, EngineError> {
        let len = self.engine.len();
        let index = match insertion::validate_target(target, len) {
            Ok(index) => index,
            Err(reason) => {
                log::debug!("Skipping {kind} insertion: {reason:?}");
                return Ok(InsertOutcome::Skipped(reason));
            }
        };

        let at_tail = insertion::is_tail_insertion(len, index);
        self.engine.insert_embed(kind, data, index)?;
        self.close();

        if at_tail {
            self.engine.append_line();
        }

        log::debug!("Inserted {kind} at {index} (appended line: {at_tail})");
        Ok(InsertOutcome::Inserted {
            index,
            appended_line: at_tail,
        })
    }

    fn transition(&mut self, next: ToolbarState) {
        if self.state != next {
            log::debug!("toolbar: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }
}
