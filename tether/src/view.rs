//! Views, the handlers of message components.

use crate::{
    client::{Bind, Client, Transport},
    context::{Context, ViewContext},
    error::{BuildError, ComponentError, LayoutError, LifecycleError},
    event::{EventKind, InteractionEvent},
    handler::{Binding, Handler, HandlerCore, HandlerId, HandlerState, ItemSet},
    hook::{CheckHook, ErrorHandlerHook, ItemCallback, TimeoutHook},
    item::{Item, ViewItem},
    layout::MAX_ITEMS,
    response::ResponseState,
    twilight_exports::{Component, Id, MessageMarker},
    CallbackResult, DefaultError,
};
use parking_lot::Mutex;
use std::{any::Any, future::Future, sync::Arc, time::Duration};
use tracing::{debug, error};

pub use crate::context::AutodeferOptions;

/// The timeout views use unless told otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A callback attached to a view item.
pub type ViewCallback = ItemCallback<ViewContext, ViewItem>;

struct ViewInner {
    core: HandlerCore,
    items: Mutex<ItemSet<ViewItem, ViewContext>>,
    autodefer: AutodeferOptions,
    transient: bool,
    check: Option<CheckHook<ViewContext>>,
    on_timeout: Option<TimeoutHook<View>>,
    on_error: Option<ErrorHandlerHook<ViewContext>>,
    last_context: Mutex<Option<Context>>,
    owner: Mutex<Option<Owner>>,
}

/// Whatever wraps the view and must live as long as the view listens.
pub(crate) type Owner = Arc<dyn Any + Send + Sync>;

/// A set of buttons and select menus attached to a message.
///
/// Views are cheap to clone, every clone refers to the same view.
#[derive(Clone)]
pub struct View {
    inner: Arc<ViewInner>,
}

impl View {
    /// Creates a new [view builder](ViewBuilder).
    pub fn builder() -> ViewBuilder {
        ViewBuilder::default()
    }

    /// Creates an empty view with the default options.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn id(&self) -> HandlerId {
        self.inner.core.id()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.core.timeout()
    }

    pub fn state(&self) -> HandlerState {
        self.inner.core.state()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == HandlerState::Listening
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == HandlerState::Stopped
    }

    /// Whether the view can be started without a message and survive restarts.
    ///
    /// That requires no timeout and every item to have a user supplied custom id.
    pub fn is_persistent(&self) -> bool {
        !self.inner.transient && self.timeout().is_none() && self.inner.items.lock().is_persistent()
    }

    /// The message the view is bound to.
    pub fn message_id(&self) -> Option<Id<MessageMarker>> {
        match self.inner.core.binding() {
            Some(Binding::Message(message_id)) => Some(message_id),
            _ => None,
        }
    }

    /// Attaches an item along with the callback executed when it is used.
    pub fn add_item<F, Fut>(&self, item: impl Into<ViewItem>, callback: F) -> Result<(), LayoutError>
    where
        F: Fn(ViewContext, ViewItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.insert(item.into(), Some(ItemCallback::new(callback)))
    }

    /// Attaches an item without callback, such as a link button.
    pub fn add_bare_item(&self, item: impl Into<ViewItem>) -> Result<(), LayoutError> {
        self.insert(item.into(), None)
    }

    pub(crate) fn insert(
        &self,
        item: ViewItem,
        callback: Option<ViewCallback>,
    ) -> Result<(), LayoutError> {
        self.inner.items.lock().add(item, callback)?;
        self.resync();
        Ok(())
    }

    pub fn remove_item(&self, custom_id: &str) -> Option<ViewItem> {
        let removed = self.inner.items.lock().remove(custom_id);
        if removed.is_some() {
            self.resync();
        }
        removed
    }

    pub fn clear_items(&self) -> Vec<ViewItem> {
        let removed = self.inner.items.lock().clear();
        self.resync();
        removed
    }

    /// A snapshot of the item with the given custom id.
    pub fn item(&self, custom_id: &str) -> Option<ViewItem> {
        self.inner
            .items
            .lock()
            .get(custom_id)
            .map(|slot| slot.item.clone())
    }

    /// A snapshot of every item, in insertion order.
    pub fn items(&self) -> Vec<ViewItem> {
        self.inner.items.lock().items()
    }

    /// Edits the item with the given custom id in place.
    pub fn edit_item<R>(&self, custom_id: &str, fun: impl FnOnce(&mut ViewItem) -> R) -> Option<R> {
        self.inner
            .items
            .lock()
            .get_mut(custom_id)
            .map(|slot| fun(&mut slot.item))
    }

    pub fn set_disabled_all(&self, disabled: bool) {
        for slot in self.inner.items.lock().slots_mut() {
            slot.item.set_disabled(disabled);
        }
    }

    /// The row the item with the given custom id is rendered on.
    pub fn rendered_row(&self, custom_id: &str) -> Option<u8> {
        self.inner.items.lock().row_of(custom_id)
    }

    /// Renders the items as action rows, an empty view renders nothing.
    pub fn build(&self) -> Vec<Component> {
        self.inner.items.lock().build()
    }

    /// The context of the last interaction received by the view.
    pub fn last_context(&self) -> Option<Context> {
        self.inner.last_context.lock().clone()
    }

    pub(crate) fn set_last_context(&self, context: Context) {
        *self.inner.last_context.lock() = Some(context);
    }

    /// Keeps the given owner alive until the view stops.
    pub(crate) fn keep_alive(&self, owner: Owner) {
        *self.inner.owner.lock() = Some(owner);
        if self.is_stopped() {
            self.inner.owner.lock().take();
        }
    }

    /// Starts the view with the given client, see [Client::start_view].
    pub fn start(&self, client: &Client, bind: Bind) -> Result<(), LifecycleError> {
        client.start_view(self, bind)
    }

    /// Stops the view, cancelling its timeout and running callbacks.
    ///
    /// Stopping a stopped view does nothing.
    pub fn stop(&self) {
        if !self.inner.core.claim_stop() {
            return;
        }

        debug!("Stopping view [{}]", self.id());
        let owner = self.teardown(false);
        self.inner.core.signal_stopped();
        drop(owner);
    }

    /// Waits until the view stops.
    pub async fn wait(&self) {
        self.inner.core.wait().await
    }

    /// Waits until the view stops, returning false if the duration elapsed first.
    pub async fn wait_timeout(&self, duration: Duration) -> bool {
        self.inner.core.wait_timeout(duration).await
    }

    pub(crate) fn start_timeout(&self) {
        let view = Arc::downgrade(&self.inner);
        self.inner.core.start_timeout(move || async move {
            if let Some(inner) = view.upgrade() {
                View { inner }.handle_timeout().await;
            }
        });
    }

    async fn handle_timeout(&self) {
        if !self.inner.core.claim_stop() {
            return;
        }

        debug!("View [{}] timed out", self.id());
        let owner = self.teardown(true);

        if let Some(hook) = &self.inner.on_timeout {
            if let Err(error) = hook.call(self.clone()).await {
                self.report_error(error, None).await;
            }
        }

        self.inner.core.signal_stopped();
        drop(owner);
    }

    /// Deregisters the view and cancels its tasks, handing back its owner.
    fn teardown(&self, from_timeout: bool) -> Option<Owner> {
        if let Some(client) = self.inner.core.client() {
            client.unregister(self.id());
        }
        self.inner.core.shutdown(from_timeout);
        self.inner.owner.lock().take()
    }

    fn resync(&self) {
        if self.state() != HandlerState::Listening {
            return;
        }
        if let Some(client) = self.inner.core.client() {
            client.resync(Arc::new(self.clone()));
        }
    }

    async fn run(&self, context: ViewContext) {
        let passed = match &self.inner.check {
            Some(check) => check.call(context.clone()).await,
            None => true,
        };

        if !passed {
            debug!(
                "View [{}] check rejected interaction [{}]",
                self.id(),
                context.event().id
            );
            context.release();
            return;
        }

        let resolved = self
            .inner
            .items
            .lock()
            .get_mut(context.custom_id())
            .map(|slot| {
                slot.item.refresh(context.event());
                (slot.item.clone(), slot.callback.clone())
            });

        if let Some((item, Some(callback))) = resolved {
            debug!("Executing view [{}] item [{}]", self.id(), context.custom_id());
            if let Err(error) = callback.call(context.clone(), item).await {
                self.report_error(error, Some(context.clone())).await;
            }
        }

        context.release();
    }

    async fn report_error(&self, error: DefaultError, context: Option<ViewContext>) {
        match &self.inner.on_error {
            Some(hook) => hook.call(error, context).await,
            None => match context {
                Some(context) => error!(
                    "Ignoring error in view [{}] for item [{}]: {}",
                    self.id(),
                    context.custom_id(),
                    error
                ),
                None => error!("Ignoring error in view [{}]: {}", self.id(), error),
            },
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for View {
    fn core(&self) -> &HandlerCore {
        &self.inner.core
    }

    fn describe(&self) -> &'static str {
        "View"
    }

    fn custom_ids(&self) -> Vec<String> {
        self.inner.items.lock().custom_ids()
    }

    fn invoke(&self, client: &Client, event: InteractionEvent, state: Arc<ResponseState>) -> bool {
        if event.kind() != EventKind::Component || !self.is_listening() {
            return false;
        }

        self.inner.core.refresh_timeout();

        if self.inner.items.lock().get(&event.custom_id).is_none() {
            debug!(
                "View [{}] has no item with custom id [{}]",
                self.id(),
                event.custom_id
            );
            return false;
        }

        debug!(
            "Dispatching interaction [{}] to view [{}]",
            event.id,
            self.id()
        );

        let context = Context::new(client.clone(), event, state);
        self.set_last_context(context.clone());
        if client.transport() == Transport::Push {
            context.spawn_autodefer(self.inner.autodefer);
        }

        let view = self.clone();
        let context = ViewContext::new(context, self.clone());
        self.inner.core.spawn(async move { view.run(context).await });
        true
    }

    fn stop(&self) {
        View::stop(self)
    }

    fn as_view(&self) -> Option<View> {
        Some(self.clone())
    }
}

/// A builder used to set the options of a [view](View).
#[derive(Clone)]
pub struct ViewBuilder {
    timeout: Option<Duration>,
    autodefer: AutodeferOptions,
    transient: bool,
    check: Option<CheckHook<ViewContext>>,
    on_timeout: Option<TimeoutHook<View>>,
    on_error: Option<ErrorHandlerHook<ViewContext>>,
}

impl Default for ViewBuilder {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            autodefer: AutodeferOptions::default(),
            transient: false,
            check: None,
            on_timeout: None,
            on_error: None,
        }
    }
}

impl ViewBuilder {
    /// Sets how long the view waits for interactions, `None` disables the timeout.
    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn autodefer(mut self, autodefer: impl Into<AutodeferOptions>) -> Self {
        self.autodefer = autodefer.into();
        self
    }

    /// Sets the check every interaction must pass before reaching item callbacks.
    pub fn check<F, Fut>(mut self, fun: F) -> Self
    where
        F: Fn(ViewContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.check = Some(CheckHook::new(fun));
        self
    }

    /// Sets the hook executed once the view times out.
    pub fn on_timeout<F, Fut>(mut self, fun: F) -> Self
    where
        F: Fn(View) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.on_timeout = Some(TimeoutHook::new(fun));
        self
    }

    /// Sets the hook receiving errors of item callbacks and the timeout hook.
    ///
    /// Errors are logged when no hook is set.
    pub fn on_error<F, Fut>(mut self, fun: F) -> Self
    where
        F: Fn(DefaultError, Option<ViewContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(ErrorHandlerHook::new(fun));
        self
    }

    /// Prevents the view from ever being persistent.
    pub(crate) fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn build(self) -> View {
        View {
            inner: Arc::new(ViewInner {
                core: HandlerCore::new(self.timeout),
                items: Mutex::new(ItemSet::new()),
                autodefer: self.autodefer,
                transient: self.transient,
                check: self.check,
                on_timeout: self.on_timeout,
                on_error: self.on_error,
                last_context: Mutex::new(None),
                owner: Mutex::new(None),
            }),
        }
    }
}

type ItemFactory = Arc<dyn Fn() -> Result<ViewItem, ComponentError> + Send + Sync>;

#[derive(Clone)]
struct TemplateEntry {
    factory: ItemFactory,
    callback: Option<ViewCallback>,
}

/// A reusable definition of a view, every [instance](ViewTemplate::instantiate) gets
/// freshly built items.
#[derive(Clone)]
pub struct ViewTemplate {
    builder: ViewBuilder,
    entries: Vec<TemplateEntry>,
}

impl ViewTemplate {
    /// Creates a template whose views use the options of the given builder.
    pub fn new(builder: ViewBuilder) -> Self {
        Self {
            builder,
            entries: Vec::new(),
        }
    }

    /// Registers an item factory along with its callback.
    ///
    /// # Panics
    ///
    /// Panics if the template already has 25 items.
    pub fn item<T, F, C, Fut>(mut self, factory: F, callback: C) -> Self
    where
        T: Into<ViewItem>,
        F: Fn() -> Result<T, ComponentError> + Send + Sync + 'static,
        C: Fn(ViewContext, ViewItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.push(Self::factory(factory), Some(ItemCallback::new(callback)));
        self
    }

    /// Registers an item factory without callback.
    ///
    /// # Panics
    ///
    /// Panics if the template already has 25 items.
    pub fn bare_item<T, F>(mut self, factory: F) -> Self
    where
        T: Into<ViewItem>,
        F: Fn() -> Result<T, ComponentError> + Send + Sync + 'static,
    {
        self.push(Self::factory(factory), None);
        self
    }

    fn factory<T, F>(factory: F) -> ItemFactory
    where
        T: Into<ViewItem>,
        F: Fn() -> Result<T, ComponentError> + Send + Sync + 'static,
    {
        Arc::new(move || factory().map(Into::into))
    }

    fn push(&mut self, factory: ItemFactory, callback: Option<ViewCallback>) {
        if self.entries.len() >= MAX_ITEMS {
            panic!("View templates can hold at most {} items", MAX_ITEMS);
        }

        self.entries.push(TemplateEntry { factory, callback });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a new view out of the template.
    pub fn instantiate(&self) -> Result<View, BuildError> {
        let view = self.builder.clone().build();
        for entry in &self.entries {
            view.insert((entry.factory)()?, entry.callback.clone())?;
        }

        Ok(view)
    }
}
