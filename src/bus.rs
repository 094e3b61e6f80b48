//! Typed event bus for run lifecycle milestones.
//!
//! The orchestrator publishes observational events (indexing started, a
//! cataloger task started, the terminal exit event) that UI or telemetry
//! collaborators may subscribe to. Publishing never gates correctness: a bus
//! with zero subscribers is valid, and a hung subscriber only slows
//! producers down, it cannot corrupt a run.

use crate::error::Result;
use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// The deferred delivery step of a finished run.
///
/// Carrying the final write as a value on the terminal event decouples "the
/// catalog is logically complete" from "where the document goes". Whichever
/// subscriber handles the exit event invokes it; repeat invocations are
/// no-ops.
#[derive(Clone)]
pub struct FinalAction {
    inner: Arc<Mutex<Option<Box<dyn FnOnce() -> Result<()> + Send>>>>,
}

impl FinalAction {
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::new(action)))),
        }
    }

    /// Run the action. Exactly one caller across all clones executes it;
    /// later calls log and return `Ok`.
    pub fn invoke(&self) -> Result<()> {
        let action = match self.inner.lock() {
            Ok(mut guard) => guard.take(),
            Err(mut poisoned) => poisoned.get_mut().take(),
        };
        match action {
            Some(action) => action(),
            None => {
                tracing::debug!("final action already invoked");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for FinalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FinalAction")
    }
}

/// Lifecycle events published during a run.
#[derive(Debug, Clone)]
pub enum Event {
    /// The content source began indexing its filesystem
    IndexingStarted { path: String },
    /// A cataloger task was launched by the orchestrator
    CatalogerTaskStarted { name: String },
    /// The run finished; the carried action delivers the final document
    Exit(FinalAction),
    /// A newer application release is available
    UpdateAvailable { version: String },
}

/// Multi-producer/multi-consumer event stream.
///
/// Cloned handles share one subscriber list. Subscribers that drop their
/// receiver are pruned on the next publish.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<Event>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = channel();
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.push(tx),
            Err(mut poisoned) => poisoned.get_mut().push(tx),
        }
        rx
    }

    /// Deliver an event to every live subscriber.
    pub fn publish(&self, event: Event) {
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventBus")
    }
}
