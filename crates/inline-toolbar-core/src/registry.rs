//! Embed registry binder.
//!
//! Turns the engine's registered embed types into picker buttons and routes
//! button activations into [`ToolbarController`] insertions. Types with a
//! trigger collect their data first; the trigger resolves through a
//! [`TriggerCallback`] whenever it is ready, and [`EmbedBinder::pump`] feeds
//! resolved activations to the controller from the host's event loop.

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::engine::{DocumentEngine, EmbedData, EngineError, LayoutQuery, empty_data};
use crate::toolbar::{InsertOutcome, ToolbarController, TriggerTarget};

/// External data collection for an embed type (file picker, URL prompt, ...).
///
/// Implementations call [`TriggerCallback::resolve`] at most once, now or
/// later. Dropping the callback without resolving cancels the activation.
pub trait EmbedTrigger {
    fn collect(&self, done: TriggerCallback);
}

impl<F> EmbedTrigger for F
where
    F: Fn(TriggerCallback),
{
    fn collect(&self, done: TriggerCallback) {
        self(done)
    }
}

/// An activation whose data is ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEmbed {
    pub key: String,
    pub data: EmbedData,
    /// Toolbar index when the trigger was invoked
    pub target: Option<usize>,
}

/// Completion handle handed to a trigger.
#[derive(Debug)]
pub struct TriggerCallback {
    key: String,
    target: Option<usize>,
    sender: Sender<ResolvedEmbed>,
}

impl TriggerCallback {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Deliver the collected data; `None` inserts with an empty payload
    pub fn resolve(self, data: Option<EmbedData>) {
        let resolved = ResolvedEmbed {
            key: self.key,
            data: data.unwrap_or_else(empty_data),
            target: self.target,
        };
        if self.sender.send(resolved).is_err() {
            log::debug!("Embed binder dropped before trigger resolved");
        }
    }
}

/// One picker control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedButton {
    pub key: String,
    pub label: String,
    pub class_name: String,
    pub has_trigger: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    Inserted(InsertOutcome),
    /// The trigger is collecting data; see [`EmbedBinder::pump`]
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolbarError {
    #[error("No embed button registered for '{0}'")]
    UnknownEmbedType(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

struct Binding {
    button: EmbedButton,
    trigger: Option<Rc<dyn EmbedTrigger>>,
}

pub struct EmbedBinder {
    bindings: Vec<Binding>,
    target: TriggerTarget,
    sender: Sender<ResolvedEmbed>,
    receiver: Receiver<ResolvedEmbed>,
}

impl EmbedBinder {
    /// Build one button per embed type registered with `engine`
    pub fn new<E: DocumentEngine>(engine: &E, target: TriggerTarget) -> Self {
        let bindings = engine
            .embed_types()
            .into_iter()
            .map(|embed| Binding {
                button: EmbedButton {
                    label: embed.key.clone(),
                    class_name: format!("tb-{}", embed.key),
                    has_trigger: embed.trigger.is_some(),
                    key: embed.key,
                },
                trigger: embed.trigger,
            })
            .collect::<Vec<_>>();
        log::debug!("Bound {} embed buttons", bindings.len());

        let (sender, receiver) = mpsc::channel();
        Self {
            bindings,
            target,
            sender,
            receiver,
        }
    }

    /// Bind against the controller's engine using its trigger policy
    pub fn for_controller<E, L>(controller: &ToolbarController<E, L>) -> Self
    where
        E: DocumentEngine,
        L: LayoutQuery,
    {
        Self::new(controller.engine(), controller.policy().trigger_target)
    }

    pub fn buttons(&self) -> impl Iterator<Item = &EmbedButton> {
        self.bindings.iter().map(|binding| &binding.button)
    }

    pub fn button(&self, key: &str) -> Option<&EmbedButton> {
        self.buttons().find(|button| button.key == key)
    }

    /// Handle a click on the button for `key`
    pub fn activate<E, L>(
        &self,
        key: &str,
        controller: &mut ToolbarController<E, L>,
    ) -> Result<Activation, ToolbarError>
    where
        E: DocumentEngine,
        L: LayoutQuery,
    {
        let binding = self
            .bindings
            .iter()
            .find(|binding| binding.button.key == key)
            .ok_or_else(|| ToolbarError::UnknownEmbedType(key.to_string()))?;

        let Some(trigger) = &binding.trigger else {
            let outcome = controller.insert_embed(key, empty_data())?;
            return Ok(Activation::Inserted(outcome));
        };

        trigger.collect(TriggerCallback {
            key: key.to_string(),
            target: controller.last_index(),
            sender: self.sender.clone(),
        });
        Ok(Activation::Pending)
    }

    /// Insert every activation whose trigger has resolved since the last call.
    ///
    /// Returns one result per activation in resolution order. A failed
    /// insertion does not stop the rest of the queue from draining.
    pub fn pump<E, L>(
        &self,
        controller: &mut ToolbarController<E, L>,
    ) -> Vec<Result<InsertOutcome, ToolbarError>>
    where
        E: DocumentEngine,
        L: LayoutQuery,
    {
        self.receiver
            .try_iter()
            .map(|resolved| {
                let result = match self.target {
                    TriggerTarget::Current => {
                        controller.insert_embed(&resolved.key, resolved.data)
                    }
                    TriggerTarget::Snapshot => {
                        controller.insert_embed_at(resolved.target, &resolved.key, resolved.data)
                    }
                };
                result.map_err(|err| {
                    log::warn!("Failed to insert resolved {} embed: {err}", resolved.key);
                    ToolbarError::from(err)
                })
            })
            .collect()
    }
}
