//! Lifecycle and item bookkeeping shared by every handler.

use crate::{
    client::{Client, WeakClient},
    error::{LayoutError, LifecycleError},
    event::InteractionEvent,
    hook::ItemCallback,
    item::Item,
    layout::{self, MAX_ITEMS},
    response::ResponseState,
    twilight_exports::{Component, Id, MessageMarker},
    view::View,
};
use parking_lot::Mutex;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle, time::Instant};

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    /// The handler and task key of the callback task being polled.
    static CURRENT_TASK: (HandlerId, u64);
}

/// A process unique identifier of a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for HandlerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle of a handler, it only moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerState {
    Created,
    Listening,
    Stopped,
}

/// How a listening handler is found by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Binding {
    /// Routed by the custom ids of its items.
    Unbound,
    /// Routed by custom ids until the first event carrying a message binds it.
    Pending,
    /// Routed by the message its items are attached to.
    Message(Id<MessageMarker>),
}

struct Lifecycle {
    state: HandlerState,
    client: WeakClient,
    binding: Option<Binding>,
}

/// The state machine every handler is built around.
pub(crate) struct HandlerCore {
    id: HandlerId,
    timeout: Option<Duration>,
    lifecycle: Mutex<Lifecycle>,
    deadline: Arc<Mutex<Option<Instant>>>,
    timeout_task: Mutex<Option<JoinHandle<()>>>,
    tasks: Mutex<Vec<(u64, JoinHandle<()>)>>,
    next_task: AtomicU64,
    stopped: watch::Sender<bool>,
}

impl HandlerCore {
    pub(crate) fn new(timeout: Option<Duration>) -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            id: HandlerId::next(),
            timeout,
            lifecycle: Mutex::new(Lifecycle {
                state: HandlerState::Created,
                client: WeakClient::default(),
                binding: None,
            }),
            deadline: Default::default(),
            timeout_task: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            next_task: AtomicU64::new(0),
            stopped,
        }
    }

    pub(crate) fn id(&self) -> HandlerId {
        self.id
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn state(&self) -> HandlerState {
        self.lifecycle.lock().state
    }

    /// The client the handler was started with, if it is still alive.
    pub(crate) fn client(&self) -> Option<Client> {
        self.lifecycle.lock().client.upgrade()
    }

    pub(crate) fn binding(&self) -> Option<Binding> {
        self.lifecycle.lock().binding
    }

    pub(crate) fn set_binding(&self, binding: Binding) {
        self.lifecycle.lock().binding = Some(binding);
    }

    /// Moves the handler from created to listening.
    pub(crate) fn begin(&self, client: WeakClient, binding: Binding) -> Result<(), LifecycleError> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            HandlerState::Created => {}
            HandlerState::Listening => return Err(LifecycleError::AlreadyStarted),
            HandlerState::Stopped => return Err(LifecycleError::AlreadyStopped),
        }

        lifecycle.state = HandlerState::Listening;
        lifecycle.client = client;
        lifecycle.binding = Some(binding);
        Ok(())
    }

    /// Moves the handler to the stopped state, returning false if it was already stopped.
    ///
    /// Only the caller that gets true must run the stop path.
    pub(crate) fn claim_stop(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state == HandlerState::Stopped {
            return false;
        }

        lifecycle.state = HandlerState::Stopped;
        true
    }

    /// Schedules the given function to run once the handler stays idle for its timeout.
    pub(crate) fn start_timeout<F, Fut>(&self, on_timeout: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(timeout) = self.timeout else {
            return;
        };

        *self.deadline.lock() = Some(Instant::now() + timeout);
        let deadline = Arc::clone(&self.deadline);

        let task = tokio::spawn(async move {
            loop {
                let current = *deadline.lock();
                let Some(at) = current else {
                    return;
                };

                if Instant::now() >= at {
                    break;
                }
                tokio::time::sleep_until(at).await;
            }

            on_timeout().await;
        });

        *self.timeout_task.lock() = Some(task);
    }

    /// Pushes the timeout deadline back, called on every dispatched event.
    pub(crate) fn refresh_timeout(&self) {
        if let (Some(timeout), Some(deadline)) = (self.timeout, self.deadline.lock().as_mut()) {
            *deadline = Instant::now() + timeout;
        }
    }

    /// Spawns a callback task tracked by the handler, cancelled when the handler stops.
    pub(crate) fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock();
        if self.state() == HandlerState::Stopped {
            return;
        }

        tasks.retain(|(_, task)| !task.is_finished());
        let key = self.next_task.fetch_add(1, Ordering::Relaxed);
        tasks.push((key, tokio::spawn(CURRENT_TASK.scope((self.id, key), future))));
    }

    /// Cancels the timeout and every tracked task except the one calling this.
    pub(crate) fn shutdown(&self, from_timeout: bool) {
        self.deadline.lock().take();

        let timeout_task = self.timeout_task.lock().take();
        if let Some(task) = timeout_task {
            if !from_timeout {
                task.abort();
            }
        }

        let current = CURRENT_TASK.try_with(|task| *task).ok();
        let tasks = std::mem::take(&mut *self.tasks.lock());

        for (key, task) in tasks {
            if current != Some((self.id, key)) {
                task.abort();
            }
        }
    }

    /// Releases everyone [waiting](Self::wait) on the handler.
    pub(crate) fn signal_stopped(&self) {
        self.stopped.send_replace(true);
    }

    pub(crate) async fn wait(&self) {
        let mut receiver = self.stopped.subscribe();
        loop {
            let stopped = *receiver.borrow();
            if stopped || receiver.changed().await.is_err() {
                return;
            }
        }
    }

    /// Waits for the handler to stop, returning false if the given duration elapsed first.
    pub(crate) async fn wait_timeout(&self, duration: Duration) -> bool {
        tokio::time::timeout(duration, self.wait()).await.is_ok()
    }
}

/// An item attached to a handler, along with its callback and rendered row.
pub(crate) struct Slot<I, C> {
    pub(crate) item: I,
    pub(crate) callback: Option<ItemCallback<C, I>>,
    pub(crate) row: u8,
}

/// The items of a handler, kept in insertion order and laid out on every change.
pub(crate) struct ItemSet<I, C> {
    slots: Vec<Slot<I, C>>,
}

impl<I: Item, C> ItemSet<I, C> {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub(crate) fn add(
        &mut self,
        item: I,
        callback: Option<ItemCallback<C, I>>,
    ) -> Result<(), LayoutError> {
        if let Some(custom_id) = item.custom_id() {
            if self.position(custom_id).is_some() {
                return Err(LayoutError::ItemAlreadyAttached {
                    custom_id: custom_id.to_owned(),
                });
            }
        }

        if self.slots.len() >= MAX_ITEMS {
            return Err(LayoutError::TooManyItems {
                count: self.slots.len() + 1,
            });
        }

        let mut items = self.slots.iter().map(|slot| &slot.item).collect::<Vec<_>>();
        items.push(&item);
        let rows = layout::assign_rows(items)?;

        self.slots.push(Slot {
            item,
            callback,
            row: 0,
        });
        self.apply(rows);
        Ok(())
    }

    pub(crate) fn remove(&mut self, custom_id: &str) -> Option<I> {
        let index = self.position(custom_id)?;
        let slot = self.slots.remove(index);

        // First fit packing is not monotone, the previous rows stay valid if it fails.
        if let Ok(rows) = layout::assign_rows(self.slots.iter().map(|slot| &slot.item)) {
            self.apply(rows);
        }

        Some(slot.item)
    }

    pub(crate) fn clear(&mut self) -> Vec<I> {
        self.slots.drain(..).map(|slot| slot.item).collect()
    }

    pub(crate) fn get(&self, custom_id: &str) -> Option<&Slot<I, C>> {
        self.position(custom_id).map(|index| &self.slots[index])
    }

    pub(crate) fn get_mut(&mut self, custom_id: &str) -> Option<&mut Slot<I, C>> {
        let index = self.position(custom_id)?;
        Some(&mut self.slots[index])
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut Slot<I, C>> {
        self.slots.iter_mut()
    }

    pub(crate) fn items(&self) -> Vec<I> {
        self.slots.iter().map(|slot| slot.item.clone()).collect()
    }

    pub(crate) fn custom_ids(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter_map(|slot| slot.item.custom_id().map(ToOwned::to_owned))
            .collect()
    }

    pub(crate) fn row_of(&self, custom_id: &str) -> Option<u8> {
        self.get(custom_id).map(|slot| slot.row)
    }

    pub(crate) fn is_persistent(&self) -> bool {
        self.slots.iter().all(|slot| slot.item.is_persistent())
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn build(&self) -> Vec<Component> {
        layout::build_rows(self.slots.iter().map(|slot| (&slot.item, slot.row)))
    }

    fn position(&self, custom_id: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.item.custom_id() == Some(custom_id))
    }

    fn apply(&mut self, rows: Vec<u8>) {
        for (slot, row) in self.slots.iter_mut().zip(rows) {
            slot.row = row;
        }
    }
}

/// A listening handler as seen by the client's registry.
pub(crate) trait Handler: Send + Sync + 'static {
    fn core(&self) -> &HandlerCore;

    /// A short name used in logs.
    fn describe(&self) -> &'static str;

    /// The custom ids the handler is routed by while unbound.
    fn custom_ids(&self) -> Vec<String>;

    /// Accepts an event, returning false if nothing in the handler targets it.
    fn invoke(&self, client: &Client, event: InteractionEvent, state: Arc<ResponseState>) -> bool;

    fn stop(&self);

    fn as_view(&self) -> Option<View> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::Button;
    use std::sync::atomic::AtomicUsize;

    fn button(custom_id: &str) -> Button {
        Button::builder()
            .label(custom_id)
            .custom_id(custom_id)
            .build()
            .unwrap()
    }

    #[test]
    fn duplicate_custom_ids_are_rejected() {
        let mut items = ItemSet::<Button, ()>::new();

        items.add(button("a"), None).unwrap();
        assert_eq!(
            items.add(button("a"), None),
            Err(LayoutError::ItemAlreadyAttached {
                custom_id: "a".to_owned()
            })
        );
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn failed_additions_leave_the_set_untouched() {
        let mut items = ItemSet::<Button, ()>::new();
        for index in 0..25 {
            items.add(button(&index.to_string()), None).unwrap();
        }

        assert_eq!(
            items.add(button("extra"), None),
            Err(LayoutError::TooManyItems { count: 26 })
        );
        assert_eq!(items.len(), 25);
        assert_eq!(items.row_of("24"), Some(4));
    }

    #[test]
    fn removal_repacks_rows() {
        let mut items = ItemSet::<Button, ()>::new();
        for index in 0..6 {
            items.add(button(&index.to_string()), None).unwrap();
        }
        assert_eq!(items.row_of("5"), Some(1));

        assert!(items.remove("0").is_some());
        assert!(items.remove("missing").is_none());
        assert_eq!(items.row_of("5"), Some(0));
        assert_eq!(items.custom_ids(), ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        let core = HandlerCore::new(None);

        assert_eq!(core.state(), HandlerState::Created);
        core.begin(WeakClient::default(), Binding::Unbound).unwrap();
        assert_eq!(core.state(), HandlerState::Listening);
        assert_eq!(
            core.begin(WeakClient::default(), Binding::Unbound),
            Err(LifecycleError::AlreadyStarted)
        );

        assert!(core.claim_stop());
        assert!(!core.claim_stop());
        assert_eq!(
            core.begin(WeakClient::default(), Binding::Unbound),
            Err(LifecycleError::AlreadyStopped)
        );
    }

    #[test]
    fn handler_ids_are_unique() {
        assert_ne!(HandlerCore::new(None).id(), HandlerCore::new(None).id());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_after_idle_period() {
        let core = HandlerCore::new(Some(Duration::from_secs(10)));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        core.start_timeout(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(6)).await;
        core.refresh_timeout();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_timeout() {
        let core = HandlerCore::new(Some(Duration::from_secs(1)));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        core.start_timeout(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        core.shutdown(false);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_spares_the_calling_task() {
        let core = Arc::new(HandlerCore::new(None));
        let (sender, receiver) = tokio::sync::oneshot::channel();

        let inner = Arc::clone(&core);
        core.spawn(async move {
            inner.shutdown(false);
            tokio::task::yield_now().await;
            let _ = sender.send(());
        });

        assert!(receiver.await.is_ok());
    }

    #[tokio::test]
    async fn shutdown_aborts_other_tasks() {
        let core = HandlerCore::new(None);
        let (sender, receiver) = tokio::sync::oneshot::channel::<()>();

        core.spawn(async move {
            futures::future::pending::<()>().await;
            drop(sender);
        });
        core.shutdown(false);

        assert!(receiver.await.is_err());
    }

    #[tokio::test]
    async fn stopped_handlers_spawn_nothing() {
        let core = HandlerCore::new(None);
        let ran = Arc::new(AtomicUsize::new(0));

        assert!(core.claim_stop());
        let counter = Arc::clone(&ran);
        core.spawn(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::task::yield_now().await;

        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn waiters_are_released_on_stop() {
        let core = Arc::new(HandlerCore::new(None));

        assert!(!core.wait_timeout(Duration::from_millis(10)).await);

        let waiter = Arc::clone(&core);
        let handle = tokio::spawn(async move { waiter.wait().await });
        core.signal_stopped();

        handle.await.unwrap();
        core.wait().await;
    }
}
