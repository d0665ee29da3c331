#![forbid(unsafe_code)]

//! Observers for palette state changes.
//!
//! Every store (and the bridge) owns an [`ObserverSet`]. Observers receive a
//! typed [`StateChange`] and are detached through the [`Subscription`]
//! handle returned when they register.
//!
//! # Invariants
//!
//! 1. Observers are notified synchronously, in registration order.
//! 2. A panicking observer is logged and skipped; the rest still run.
//! 3. Changes raised while a notification is in progress are queued and
//!    delivered after it, so every observer sees changes in the order they
//!    were applied.
//! 4. The same `Rc` observer cannot be registered twice on one set.
//! 5. Dropping a [`Subscription`] removes the observer before the next
//!    delivery, including one already in progress.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use spotlight_core::{PaletteCommand, PaletteState};

/// Identifier of a registered observer, unique per set.
pub type SubId = u64;

/// Payload delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// The command that produced this state.
    pub command: PaletteCommand,
    /// State right after the command was applied.
    pub state: PaletteState,
}

/// Receives palette state changes.
pub trait PaletteObserver {
    /// Called once per applied command.
    fn on_change(&self, change: &StateChange);
}

impl<F> PaletteObserver for F
where
    F: Fn(&StateChange),
{
    fn on_change(&self, change: &StateChange) {
        self(change)
    }
}

/// Errors from registering an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    /// The observer is already registered under this id.
    AlreadySubscribed(SubId),
}

impl fmt::Display for SubscribeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscribeError::AlreadySubscribed(id) => {
                write!(f, "observer already subscribed (id {id})")
            }
        }
    }
}

impl std::error::Error for SubscribeError {}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

type Entry = (SubId, Rc<dyn PaletteObserver>);

/// Ordered observer registry with re-entrancy-safe delivery.
pub(crate) struct ObserverSet {
    name: &'static str,
    entries: RefCell<Vec<Entry>>,
    next_id: Cell<SubId>,
    queued: RefCell<VecDeque<StateChange>>,
    delivering: Cell<bool>,
}

impl ObserverSet {
    pub(crate) fn new(name: &'static str) -> Rc<Self> {
        Rc::new(Self {
            name,
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            queued: RefCell::new(VecDeque::new()),
            delivering: Cell::new(false),
        })
    }

    pub(crate) fn subscribe(
        self: &Rc<Self>,
        observer: Rc<dyn PaletteObserver>,
    ) -> Result<Subscription, SubscribeError> {
        let mut entries = self.entries.borrow_mut();
        if let Some((id, _)) = entries
            .iter()
            .find(|(_, existing)| std::ptr::addr_eq(Rc::as_ptr(existing), Rc::as_ptr(&observer)))
        {
            tracing::warn!(set = self.name, sub_id = *id, "duplicate observer rejected");
            return Err(SubscribeError::AlreadySubscribed(*id));
        }
        drop(entries);
        Ok(self.subscribe_unchecked(observer))
    }

    /// Register an observer that is known not to be registered yet, such as
    /// one allocated by the caller just now.
    pub(crate) fn subscribe_unchecked(
        self: &Rc<Self>,
        observer: Rc<dyn PaletteObserver>,
    ) -> Subscription {
        let mut entries = self.entries.borrow_mut();
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        entries.push((id, observer));
        tracing::debug!(set = self.name, sub_id = id, observers = entries.len(), "observer subscribed");
        Subscription {
            set: Rc::downgrade(self),
            id,
        }
    }

    fn remove(&self, id: SubId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(sub, _)| *sub != id);
        let removed = entries.len() != before;
        if removed {
            tracing::debug!(set = self.name, sub_id = id, observers = entries.len(), "observer unsubscribed");
        }
        removed
    }

    fn contains(&self, id: SubId) -> bool {
        self.entries.borrow().iter().any(|(sub, _)| *sub == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Deliver `change` to every observer, or queue it behind the delivery
    /// already in progress.
    pub(crate) fn dispatch(&self, change: StateChange) {
        self.queued.borrow_mut().push_back(change);
        if self.delivering.replace(true) {
            return;
        }

        loop {
            let next = self.queued.borrow_mut().pop_front();
            let Some(change) = next else { break };
            let observers: Vec<Entry> = self.entries.borrow().clone();
            for (id, observer) in observers {
                if !self.contains(id) {
                    continue;
                }
                let result = catch_unwind(AssertUnwindSafe(|| observer.on_change(&change)));
                if let Err(payload) = result {
                    tracing::warn!(
                        set = self.name,
                        sub_id = id,
                        command = change.command.name(),
                        panic = %panic_message(payload.as_ref()),
                        "observer panicked; continuing with remaining observers"
                    );
                }
            }
        }

        self.delivering.set(false);
    }
}

/// Handle for a registered observer.
///
/// Dropping the handle unsubscribes. Use [`detach`](Self::detach) to keep the
/// observer registered for the lifetime of the store.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    set: Weak<ObserverSet>,
    id: SubId,
}

impl Subscription {
    /// Identifier of this registration.
    pub fn id(&self) -> SubId {
        self.id
    }

    /// Whether the observer is still registered.
    pub fn is_active(&self) -> bool {
        self.set.upgrade().is_some_and(|set| set.contains(self.id))
    }

    /// Remove the observer now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the observer registered without holding the handle.
    pub fn detach(mut self) {
        self.set = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(set) = self.set.upgrade() {
            set.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
