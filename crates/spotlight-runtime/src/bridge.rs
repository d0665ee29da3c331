#![forbid(unsafe_code)]

//! Provider bridge: the imperative palette API.
//!
//! Callers hold a [`Spotlight`] handle and call `open`/`close`/... at any time,
//! whether or not a view that owns a [`StateStore`] is mounted.
//!
//! - **Provider live**: calls are delegated to the provider's store.
//! - **No provider**: calls are applied to the shared singleton store, queued
//!   as [`PendingOperation`]s, and the provider-requested hooks fire.
//! - **Mount**: the provider goes live and is seeded with the state the
//!   queued operations started from, then the queue is drained with
//!   snapshot-and-drain semantics. Calls made during the drain are queued and
//!   replayed after everything that was pending when the drain started.
//!   Afterwards the provider holds exactly what the singleton held.
//! - **Unmount**: the provider is unregistered and the singleton adopts its last
//!   state, so readers never see the palette jump back.
//!
//! Each pending operation is consumed exactly once. Replayed operations are
//! removed from the queue before they run, so a later mount never sees them.
//!
//! The queue is bounded by [`SpotlightConfig::queue_capacity`]. When it is full
//! the whole queue is compacted into one `Restore` of the singleton state,
//! which already reflects every queued operation.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use spotlight_core::{PaletteCommand, PaletteState, SpotlightConfig};

use crate::observer::{
    ObserverSet, PaletteObserver, StateChange, SubscribeError, Subscription, panic_message,
};
use crate::store::StateStore;

/// A mutation captured while no provider was live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    /// Enqueue sequence number, increasing across the bridge lifetime.
    pub seq: u64,
    pub command: PaletteCommand,
}

/// Bounded FIFO of pending operations.
#[derive(Debug, Clone)]
pub struct PendingQueue {
    ops: VecDeque<PendingOperation>,
    capacity: usize,
    next_seq: u64,
    compactions: u64,
}

impl PendingQueue {
    /// Empty queue holding at most `capacity` operations (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            ops: VecDeque::new(),
            capacity: capacity.max(1),
            next_seq: 0,
            compactions: 0,
        }
    }

    /// Append an operation and return its sequence number.
    pub fn push(&mut self, command: PaletteCommand) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ops.push_back(PendingOperation { seq, command });
        seq
    }

    pub fn is_full(&self) -> bool {
        self.ops.len() >= self.capacity
    }

    /// Replace every queued operation with a single `Restore(net)`.
    ///
    /// Returns how many operations were folded away.
    pub fn compact(&mut self, net: PaletteState) -> usize {
        let dropped = self.ops.len();
        self.ops.clear();
        self.compactions += 1;
        self.push(PaletteCommand::Restore(net));
        dropped
    }

    /// Remove and return everything currently queued, oldest first.
    pub fn take_snapshot(&mut self) -> Vec<PendingOperation> {
        self.ops.drain(..).collect()
    }

    /// Put operations back at the head of the queue, keeping their order.
    pub fn requeue_front(&mut self, ops: Vec<PendingOperation>) {
        for op in ops.into_iter().rev() {
            self.ops.push_front(op);
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many times the queue was compacted.
    pub fn compactions(&self) -> u64 {
        self.compactions
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.ops.iter()
    }
}

/// Identifier of one provider mount.
pub type MountId = u64;

struct LiveProvider {
    id: MountId,
    store: StateStore,
    _forward: Subscription,
}

type ProviderHook = Rc<dyn Fn()>;

struct BridgeInner {
    config: SpotlightConfig,
    singleton: StateStore,
    live: RefCell<Option<LiveProvider>>,
    queue: RefCell<PendingQueue>,
    /// Singleton state just before the oldest queued operation.
    base: RefCell<Option<PaletteState>>,
    flushing: Cell<bool>,
    provider_requested: Cell<bool>,
    next_mount_id: Cell<MountId>,
    observers: Rc<ObserverSet>,
    provider_hooks: RefCell<Vec<ProviderHook>>,
    _singleton_forward: Subscription,
}

/// Handle to the palette API. Clones share one bridge.
#[derive(Clone)]
pub struct Spotlight {
    inner: Rc<BridgeInner>,
}

impl Default for Spotlight {
    fn default() -> Self {
        Self::new()
    }
}

impl Spotlight {
    /// Bridge with default configuration.
    pub fn new() -> Self {
        Self::with_config(SpotlightConfig::default())
    }

    /// Bridge with explicit configuration.
    pub fn with_config(config: SpotlightConfig) -> Self {
        let singleton = StateStore::named("singleton");
        let inner = Rc::new_cyclic(|weak: &Weak<BridgeInner>| {
            let weak = weak.clone();
            let forward = singleton.subscribe_fn(move |change| {
                let Some(inner) = weak.upgrade() else { return };
                let live = inner.live.borrow().is_some();
                if !live {
                    inner.observers.dispatch(change.clone());
                }
            });
            BridgeInner {
                queue: RefCell::new(PendingQueue::new(config.queue_capacity)),
                base: RefCell::new(None),
                config,
                singleton: singleton.clone(),
                live: RefCell::new(None),
                flushing: Cell::new(false),
                provider_requested: Cell::new(false),
                next_mount_id: Cell::new(1),
                observers: ObserverSet::new("bridge"),
                provider_hooks: RefCell::new(Vec::new()),
                _singleton_forward: forward,
            }
        });
        Self { inner }
    }

    pub fn config(&self) -> &SpotlightConfig {
        &self.inner.config
    }

    // --- Imperative API ---

    /// Show the palette.
    pub fn open(&self) {
        self.dispatch(PaletteCommand::Open { query: None });
    }

    /// Show the palette with a seeded query.
    pub fn open_with_query(&self, query: impl Into<String>) {
        self.dispatch(PaletteCommand::Open {
            query: Some(query.into()),
        });
    }

    /// Hide the palette and reset query and selection.
    pub fn close(&self) {
        self.dispatch(PaletteCommand::Close);
    }

    /// Flip visibility. This is what a global hotkey calls.
    pub fn toggle(&self) {
        self.dispatch(PaletteCommand::Toggle);
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.dispatch(PaletteCommand::SetQuery(query.into()));
    }

    pub fn set_selected_index(&self, index: Option<usize>) {
        self.dispatch(PaletteCommand::SetSelectedIndex(index));
    }

    fn dispatch(&self, command: PaletteCommand) {
        if self.inner.flushing.get() {
            let seq = self.inner.queue.borrow_mut().push(command);
            tracing::trace!(seq, "queued behind active flush");
            return;
        }
        match self.live_store() {
            Some(store) => store.apply(command),
            None => {
                self.enqueue(command.clone());
                self.inner.singleton.apply(command);
                self.request_provider();
            }
        }
    }

    fn enqueue(&self, command: PaletteCommand) {
        let mut queue = self.inner.queue.borrow_mut();
        if queue.is_empty() {
            *self.inner.base.borrow_mut() = Some(self.inner.singleton.state());
        }
        if queue.is_full() {
            let mut net = self.inner.singleton.state();
            net.apply(&command);
            let dropped = queue.compact(net);
            tracing::warn!(
                dropped,
                capacity = queue.capacity(),
                "pending queue full; compacted into a single restore"
            );
        } else {
            let seq = queue.push(command);
            tracing::trace!(seq, pending = queue.len(), "operation queued without provider");
        }
    }

    fn request_provider(&self) {
        if !self.inner.provider_requested.replace(true) {
            tracing::debug!("provider requested");
        }
        let hooks: Vec<ProviderHook> = self.inner.provider_hooks.borrow().clone();
        for hook in hooks {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| hook())) {
                tracing::warn!(
                    panic = %panic_message(payload.as_ref()),
                    "provider-requested hook panicked"
                );
            }
        }
    }

    // --- Reads ---

    /// Current state: the provider's when live, the singleton's otherwise.
    pub fn state(&self) -> PaletteState {
        match self.live_store() {
            Some(store) => store.state(),
            None => self.inner.singleton.state(),
        }
    }

    /// The shared singleton store.
    pub fn singleton(&self) -> &StateStore {
        &self.inner.singleton
    }

    /// The live provider's store, if any.
    pub fn live_store(&self) -> Option<StateStore> {
        self.inner.live.borrow().as_ref().map(|p| p.store.clone())
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.borrow().is_some()
    }

    /// Number of operations waiting for a provider.
    pub fn pending_len(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Commands waiting for a provider, oldest first.
    pub fn pending_commands(&self) -> Vec<PaletteCommand> {
        self.inner
            .queue
            .borrow()
            .iter()
            .map(|op| op.command.clone())
            .collect()
    }

    /// How many times the pending queue was compacted.
    pub fn compactions(&self) -> u64 {
        self.inner.queue.borrow().compactions()
    }

    /// Whether a call was queued since the last mount.
    pub fn provider_requested(&self) -> bool {
        self.inner.provider_requested.get()
    }

    // --- Observers ---

    /// Observe the current state, whichever store holds it.
    pub fn subscribe(
        &self,
        observer: Rc<dyn PaletteObserver>,
    ) -> Result<Subscription, SubscribeError> {
        self.inner.observers.subscribe(observer)
    }

    pub fn subscribe_fn(&self, f: impl Fn(&StateChange) + 'static) -> Subscription {
        self.inner.observers.subscribe_unchecked(Rc::new(f))
    }

    /// Run `hook` every time an operation is queued with no provider live.
    ///
    /// The hook may mount a provider synchronously; the operation that
    /// triggered it is then replayed immediately.
    pub fn on_provider_requested(&self, hook: impl Fn() + 'static) {
        self.inner.provider_hooks.borrow_mut().push(Rc::new(hook));
    }

    // --- Provider lifecycle ---

    /// Register `store` as the live provider and replay pending operations.
    ///
    /// A provider that is already live is replaced. Dropping the returned
    /// guard unmounts.
    pub fn mount(&self, store: StateStore) -> MountGuard {
        let id = self.inner.next_mount_id.get();
        self.inner.next_mount_id.set(id + 1);

        let weak = Rc::downgrade(&self.inner);
        let forward = store.subscribe_fn(move |change| {
            if let Some(inner) = weak.upgrade() {
                inner.observers.dispatch(change.clone());
            }
        });

        let seed = self.seed_state();
        if store.state() != seed {
            store.apply(PaletteCommand::Restore(seed));
        }

        let previous = self.inner.live.replace(Some(LiveProvider {
            id,
            store,
            _forward: forward,
        }));
        if let Some(previous) = previous {
            tracing::warn!(replaced = previous.id, mount_id = id, "replacing live provider");
        }
        self.inner.provider_requested.set(false);
        tracing::debug!(mount_id = id, pending = self.pending_len(), "provider mounted");

        self.flush();

        MountGuard {
            bridge: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// State a newly mounted provider starts from, before any replay.
    fn seed_state(&self) -> PaletteState {
        let base = self.inner.base.borrow_mut().take();
        if let Some(store) = self.live_store() {
            return store.state();
        }
        match base {
            Some(base) if !self.inner.flushing.get() && self.pending_len() > 0 => base,
            _ => self.inner.singleton.state(),
        }
    }

    fn flush(&self) {
        if self.inner.flushing.replace(true) {
            return;
        }

        loop {
            let batch = self.inner.queue.borrow_mut().take_snapshot();
            if batch.is_empty() {
                break;
            }
            tracing::debug!(ops = batch.len(), "replaying pending operations");

            let mut ops = batch.into_iter();
            while let Some(op) = ops.next() {
                let Some(store) = self.live_store() else {
                    let mut rest = vec![op];
                    rest.extend(ops);
                    self.abort_flush(rest);
                    return;
                };
                let seq = op.seq;
                let name = op.command.name();
                let command = op.command;
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| store.apply(command))) {
                    tracing::warn!(
                        seq,
                        command = name,
                        panic = %panic_message(payload.as_ref()),
                        "pending operation panicked during replay; continuing"
                    );
                }
            }
        }

        self.inner.flushing.set(false);
    }

    /// The provider went away mid-flush. Put the unreplayed operations back
    /// and mirror everything queued onto the singleton.
    fn abort_flush(&self, rest: Vec<PendingOperation>) {
        let commands: Vec<PaletteCommand> = {
            let mut queue = self.inner.queue.borrow_mut();
            queue.requeue_front(rest);
            queue.iter().map(|op| op.command.clone()).collect()
        };
        tracing::debug!(pending = commands.len(), "provider unmounted during replay; requeued");
        *self.inner.base.borrow_mut() = Some(self.inner.singleton.state());
        self.inner.flushing.set(false);
        for command in commands {
            self.inner.singleton.apply(command);
        }
    }

    fn unmount(&self, id: MountId) -> bool {
        let provider = {
            let mut live = self.inner.live.borrow_mut();
            match live.as_ref() {
                Some(p) if p.id == id => live.take(),
                _ => None,
            }
        };
        let Some(provider) = provider else {
            return false;
        };
        let last = provider.store.state();
        drop(provider);
        tracing::debug!(mount_id = id, "provider unmounted");
        self.inner.singleton.apply(PaletteCommand::Restore(last));
        true
    }
}

impl fmt::Debug for Spotlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spotlight")
            .field("state", &self.state())
            .field("live", &self.is_live())
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// Keeps a provider registered; dropping it unmounts.
///
/// A guard whose provider was already replaced does nothing on drop.
#[must_use = "dropping a MountGuard unmounts the provider immediately"]
pub struct MountGuard {
    bridge: Weak<BridgeInner>,
    id: MountId,
}

impl MountGuard {
    pub fn id(&self) -> MountId {
        self.id
    }

    /// Whether this guard's provider is still the live one.
    pub fn is_live(&self) -> bool {
        self.bridge.upgrade().is_some_and(|inner| {
            inner
                .live
                .borrow()
                .as_ref()
                .is_some_and(|p| p.id == self.id)
        })
    }

    /// Unmount now.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.bridge.upgrade() {
            Spotlight { inner }.unmount(self.id);
        }
    }
}

impl fmt::Debug for MountGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountGuard")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(store: &StateStore) -> (Rc<RefCell<Vec<PaletteCommand>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = store.subscribe_fn(move |c| sink.borrow_mut().push(c.command.clone()));
        (log, sub)
    }

    fn open() -> PaletteCommand {
        PaletteCommand::Open { query: None }
    }

    #[test]
    fn queue_snapshot_and_requeue_keep_order() {
        let mut queue = PendingQueue::new(8);
        queue.push(open());
        queue.push(PaletteCommand::Close);
        let mut taken = queue.take_snapshot();
        assert!(queue.is_empty());
        queue.push(PaletteCommand::Toggle);
        let rest = taken.split_off(1);
        queue.requeue_front(rest);
        let seqs: Vec<_> = queue.iter().map(|op| op.seq).collect();
        assert_eq!(seqs, [1, 2]);
    }

    #[test]
    fn queue_compaction_folds_everything() {
        let mut queue = PendingQueue::new(2);
        queue.push(open());
        queue.push(PaletteCommand::SetQuery("x".into()));
        assert!(queue.is_full());
        let net = PaletteState {
            opened: true,
            query: "x".into(),
            selected_index: None,
        };
        assert_eq!(queue.compact(net.clone()), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.compactions(), 1);
        assert_eq!(queue.iter().next().unwrap().command, PaletteCommand::Restore(net));
    }

    #[test]
    fn calls_without_provider_hit_singleton_and_queue() {
        let bridge = Spotlight::new();
        bridge.open_with_query("abc");
        assert!(bridge.state().opened);
        assert_eq!(bridge.singleton().state().query, "abc");
        assert_eq!(bridge.pending_len(), 1);
        assert!(bridge.provider_requested());
        assert!(!bridge.is_live());
    }

    #[test]
    fn mount_replays_exactly_once() {
        let bridge = Spotlight::new();
        bridge.open();
        bridge.close();
        bridge.open();

        let store = StateStore::new();
        let (log, _sub) = record(&store);
        let guard = bridge.mount(store.clone());
        assert_eq!(*log.borrow(), [open(), PaletteCommand::Close, open()]);
        assert_eq!(bridge.pending_len(), 0);
        assert!(!bridge.provider_requested());
        assert!(store.state().opened);

        guard.unmount();
        let second = StateStore::new();
        let (log2, _sub2) = record(&second);
        let _guard = bridge.mount(second.clone());
        // Nothing replayed again; the new provider only inherits the state.
        assert_eq!(*log2.borrow(), [PaletteCommand::Restore(store.state())]);
        assert_eq!(second.state(), store.state());
    }

    #[test]
    fn remount_keeps_open_palette_open() {
        let bridge = Spotlight::new();
        let guard = bridge.mount(StateStore::new());
        bridge.open_with_query("kept");
        let before = bridge.state();
        drop(guard);

        let _guard = bridge.mount(StateStore::new());
        assert_eq!(bridge.state(), before);
        assert!(bridge.state().opened);
    }

    #[test]
    fn toggle_after_remount_matches_singleton() {
        for capacity in [1, 256] {
            let bridge =
                Spotlight::with_config(SpotlightConfig::default().with_queue_capacity(capacity));
            bridge.open();
            let first = bridge.mount(StateStore::new());
            drop(first);
            bridge.toggle();
            bridge.set_query("x");
            let expected = bridge.singleton().state();
            assert!(!expected.opened);

            let store = StateStore::new();
            let _guard = bridge.mount(store.clone());
            assert_eq!(store.state(), expected, "capacity {capacity}");
            assert_eq!(bridge.pending_len(), 0);
        }
    }

    #[test]
    fn provider_dropped_mid_replay_requeues_in_order() {
        let bridge = Spotlight::new();
        bridge.open();
        bridge.set_query("a");
        bridge.set_query("b");

        let first = StateStore::new();
        let handle = bridge.clone();
        let nested = Rc::new(RefCell::new(None));
        let nested_store = Rc::clone(&nested);
        let _remount = first.subscribe_fn(move |c| {
            if c.command == open() {
                let second = StateStore::new();
                *nested_store.borrow_mut() = Some(second.clone());
                let guard = handle.mount(second);
                handle.set_query("during");
                drop(guard);
            }
        });
        let (first_log, _first_sub) = record(&first);
        let _first_guard = bridge.mount(first.clone());

        assert_eq!(*first_log.borrow(), [open()]);
        assert!(!bridge.is_live());
        assert_eq!(
            bridge.pending_commands(),
            [
                PaletteCommand::SetQuery("a".into()),
                PaletteCommand::SetQuery("b".into()),
                PaletteCommand::SetQuery("during".into()),
            ]
        );
        let mirrored = bridge.singleton().state();
        assert!(mirrored.opened);
        assert_eq!(mirrored.query, "during");
        // The nested provider was seeded from the replay in progress.
        let second = nested.borrow().clone().unwrap();
        assert!(second.state().opened);

        let third = StateStore::new();
        let (third_log, _third_sub) = record(&third);
        let _guard = bridge.mount(third.clone());
        assert_eq!(
            *third_log.borrow(),
            [
                PaletteCommand::Restore(PaletteState {
                    opened: true,
                    query: String::new(),
                    selected_index: None,
                }),
                PaletteCommand::SetQuery("a".into()),
                PaletteCommand::SetQuery("b".into()),
                PaletteCommand::SetQuery("during".into()),
            ]
        );
        assert_eq!(third.state(), mirrored);
        assert_eq!(bridge.pending_len(), 0);
    }

    #[test]
    fn calls_between_unmount_and_mount_are_kept() {
        let bridge = Spotlight::new();
        let guard = bridge.mount(StateStore::new());
        bridge.open();
        drop(guard);
        bridge.set_query("late");
        assert_eq!(bridge.pending_commands(), [PaletteCommand::SetQuery("late".into())]);

        let store = StateStore::new();
        let _guard = bridge.mount(store.clone());
        assert_eq!(store.state().query, "late");
    }

    #[test]
    fn live_provider_receives_calls_directly() {
        let bridge = Spotlight::new();
        let store = StateStore::new();
        let _guard = bridge.mount(store.clone());
        bridge.toggle();
        assert!(store.state().opened);
        assert!(!bridge.singleton().state().opened);
        assert_eq!(bridge.pending_len(), 0);
    }

    #[test]
    fn nested_calls_during_flush_run_after_snapshot() {
        let bridge = Spotlight::new();
        bridge.open();
        bridge.set_query("a");

        let store = StateStore::new();
        let handle = bridge.clone();
        let _nested = store.subscribe_fn(move |c| {
            if c.command == open() {
                handle.set_query("nested");
            }
        });
        let (log, _sub) = record(&store);
        let _guard = bridge.mount(store.clone());
        assert_eq!(
            *log.borrow(),
            [
                open(),
                PaletteCommand::SetQuery("a".into()),
                PaletteCommand::SetQuery("nested".into()),
            ]
        );
        assert_eq!(store.state().query, "nested");
    }

    #[test]
    fn replay_continues_past_panicking_observer() {
        struct Panics;
        impl PaletteObserver for Panics {
            fn on_change(&self, _change: &StateChange) {
                panic!("observer failure");
            }
        }

        let bridge = Spotlight::new();
        bridge.open();
        bridge.set_query("q");
        let store = StateStore::new();
        let _p = store.subscribe(Rc::new(Panics)).unwrap();
        let _guard = bridge.mount(store.clone());
        assert_eq!(store.state().query, "q");
        assert!(store.state().opened);
    }

    #[test]
    fn bridge_observers_follow_the_current_store() {
        let bridge = Spotlight::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = bridge.subscribe_fn(move |c| sink.borrow_mut().push(c.command.name()));

        bridge.open();
        let store = StateStore::new();
        let guard = bridge.mount(store.clone());
        bridge.close();
        bridge.singleton().toggle();
        drop(guard);

        // open (singleton), open (replay), close (provider), restore (unmount)
        assert_eq!(*seen.borrow(), ["open", "open", "close", "restore"]);
    }

    #[test]
    fn unmount_hands_state_to_singleton() {
        let bridge = Spotlight::new();
        let store = StateStore::new();
        let guard = bridge.mount(store);
        bridge.open_with_query("kept");
        bridge.set_selected_index(Some(2));
        guard.unmount();
        let state = bridge.state();
        assert!(state.opened);
        assert_eq!(state.query, "kept");
        assert_eq!(state.selected_index, Some(2));
    }

    #[test]
    fn stale_guard_does_not_unmount_newer_provider() {
        let bridge = Spotlight::new();
        let first = bridge.mount(StateStore::new());
        let second_store = StateStore::new();
        let second = bridge.mount(second_store.clone());
        assert!(!first.is_live());
        drop(first);
        assert!(second.is_live());
        assert!(bridge.live_store().unwrap().ptr_eq(&second_store));
    }

    #[test]
    fn full_queue_compacts_to_net_state() {
        let bridge = Spotlight::with_config(SpotlightConfig::default().with_queue_capacity(2));
        bridge.open();
        bridge.set_query("x");
        bridge.set_selected_index(Some(1));
        assert_eq!(bridge.pending_len(), 1);
        assert_eq!(bridge.compactions(), 1);

        let store = StateStore::new();
        let _guard = bridge.mount(store.clone());
        assert_eq!(store.state(), bridge.singleton().state());
        assert_eq!(store.state().selected_index, Some(1));
    }

    #[test]
    fn hook_can_mount_synchronously() {
        let bridge = Spotlight::new();
        let store = StateStore::new();
        let slot: Rc<RefCell<Option<MountGuard>>> = Rc::new(RefCell::new(None));
        let hook_slot = Rc::clone(&slot);
        let hook_bridge = bridge.clone();
        let hook_store = store.clone();
        bridge.on_provider_requested(move || {
            if hook_slot.borrow().is_none() {
                let guard = hook_bridge.mount(hook_store.clone());
                *hook_slot.borrow_mut() = Some(guard);
            }
        });

        bridge.open_with_query("now");
        assert!(bridge.is_live());
        assert_eq!(bridge.pending_len(), 0);
        assert_eq!(store.state().query, "now");
        drop(slot.borrow_mut().take());
    }

    #[test]
    fn panicking_hook_is_isolated() {
        let bridge = Spotlight::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        bridge.on_provider_requested(|| panic!("hook failure"));
        bridge.on_provider_requested(move || counter.set(counter.get() + 1));
        bridge.open();
        bridge.close();
        assert_eq!(calls.get(), 2);
        assert_eq!(bridge.pending_len(), 2);
    }
}
