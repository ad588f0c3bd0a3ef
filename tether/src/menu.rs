//! Menus, views made of a stack of screens that can be navigated back and forth.

use crate::{
    client::Bind,
    context::{AutodeferOptions, Context, ViewContext},
    error::{LayoutError, LifecycleError, MenuError, ResponseError},
    handler::ItemSet,
    hook::{DisposeHook, ItemCallback},
    item::{Item, ViewItem},
    twilight_exports::{Component, Embed, InteractionResponseData, MessageFlags},
    view::{View, ViewCallback},
    CallbackResult,
};
use parking_lot::Mutex;
use std::{
    future::Future,
    ops::Deref,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Duration,
};
use tracing::{debug, warn};
use twilight_util::builder::InteractionResponseDataBuilder;

/// The timeout menus use unless told otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// The message payload shown along a screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScreenContent {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl ScreenContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn embeds(&self) -> &[Embed] {
        &self.embeds
    }

    pub(crate) fn to_data(&self, components: Vec<Component>, ephemeral: bool) -> InteractionResponseData {
        let mut builder = InteractionResponseDataBuilder::new()
            .components(components)
            .embeds(self.embeds.clone());

        if let Some(content) = &self.content {
            builder = builder.content(content.clone());
        }
        if ephemeral {
            builder = builder.flags(MessageFlags::EPHEMERAL);
        }

        builder.build()
    }
}

/// A callback attached to a screen item.
pub type ScreenCallback = ItemCallback<MenuContext, ViewItem>;

/// A page of a [menu](Menu), with its own items and content.
#[derive(Clone)]
pub struct Screen {
    name: String,
    content: ScreenContent,
    items: Vec<(ViewItem, Option<ScreenCallback>)>,
    on_dispose: Option<DisposeHook>,
}

impl Screen {
    /// Creates a new [screen builder](ScreenBuilder).
    pub fn builder(name: impl Into<String>) -> ScreenBuilder {
        ScreenBuilder {
            name: name.into(),
            content: ScreenContent::default(),
            items: Vec::new(),
            on_dispose: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &ScreenContent {
        &self.content
    }

    /// The items of the screen, as they were when it was last shown.
    pub fn items(&self) -> Vec<ViewItem> {
        self.items.iter().map(|(item, _)| item.clone()).collect()
    }
}

/// A builder used to create [screens](Screen).
pub struct ScreenBuilder {
    name: String,
    content: ScreenContent,
    items: Vec<(ViewItem, Option<ScreenCallback>)>,
    on_dispose: Option<DisposeHook>,
}

impl ScreenBuilder {
    pub fn content(mut self, content: ScreenContent) -> Self {
        self.content = content;
        self
    }

    pub fn item<F, Fut>(mut self, item: impl Into<ViewItem>, callback: F) -> Self
    where
        F: Fn(MenuContext, ViewItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.items
            .push((item.into(), Some(ItemCallback::new(callback))));
        self
    }

    pub fn bare_item(mut self, item: impl Into<ViewItem>) -> Self {
        self.items.push((item.into(), None));
        self
    }

    /// Sets the hook executed when the screen is popped or covered by another screen.
    pub fn on_dispose<F, Fut>(mut self, fun: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.on_dispose = Some(DisposeHook::new(fun));
        self
    }

    /// Validates that every item fits in a single view.
    pub fn build(self) -> Result<Screen, LayoutError> {
        let mut layout = ItemSet::<ViewItem, ()>::new();
        for (item, _) in &self.items {
            layout.add(item.clone(), None)?;
        }

        Ok(Screen {
            name: self.name,
            content: self.content,
            items: self.items,
            on_dispose: self.on_dispose,
        })
    }
}

/// Context given to screen callbacks.
#[derive(Clone)]
pub struct MenuContext {
    context: ViewContext,
    menu: Menu,
}

impl MenuContext {
    pub(crate) fn new(context: ViewContext, menu: Menu) -> Self {
        Self { context, menu }
    }

    /// The menu the screen belongs to.
    pub fn menu(&self) -> &Menu {
        &self.menu
    }
}

impl Deref for MenuContext {
    type Target = ViewContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

struct MenuInner {
    view: View,
    stack: Mutex<Vec<Screen>>,
    content: Mutex<ScreenContent>,
    ephemeral: AtomicBool,
}

/// A view whose items come from the screen on top of a stack.
///
/// The root screen can never be popped. Items are disabled once the menu times out.
///
/// A sent menu stays alive until its view stops, the handle can be dropped right after
/// [send](Menu::send).
#[derive(Clone)]
pub struct Menu {
    inner: Arc<MenuInner>,
}

impl Menu {
    /// Creates a new [menu builder](MenuBuilder).
    pub fn builder() -> MenuBuilder {
        MenuBuilder::default()
    }

    /// The view rendering the current screen.
    pub fn view(&self) -> &View {
        &self.inner.view
    }

    /// The amount of screens on the stack.
    pub fn depth(&self) -> usize {
        self.inner.stack.lock().len()
    }

    pub fn current_screen(&self) -> Option<Screen> {
        self.inner.stack.lock().last().cloned()
    }

    /// The names of the screens on the stack, from the root up.
    pub fn screen_names(&self) -> Vec<String> {
        self.inner
            .stack
            .lock()
            .iter()
            .map(|screen| screen.name.clone())
            .collect()
    }

    /// The payload of the current screen, along with its items.
    pub fn build_response_data(&self) -> InteractionResponseData {
        let components = self.inner.view.build();
        self.inner
            .content
            .lock()
            .to_data(components, self.inner.ephemeral.load(Ordering::Relaxed))
    }

    /// Loads the root screen without sending anything.
    pub fn load(&self, root: Screen) -> Result<(), MenuError> {
        if self.depth() != 0 {
            return Err(LifecycleError::AlreadyStarted.into());
        }

        self.show(&root)?;
        self.inner.stack.lock().push(root);
        Ok(())
    }

    /// Loads the root screen, starts listening and sends the menu in response to the
    /// given interaction.
    pub async fn send(&self, context: &Context, root: Screen, ephemeral: bool) -> Result<(), MenuError> {
        self.load(root)?;
        self.inner.ephemeral.store(ephemeral, Ordering::Relaxed);

        context.client().start_view(&self.inner.view, Bind::Auto)?;
        self.inner.view.set_last_context(context.clone());
        self.inner.view.keep_alive(self.inner.clone());

        if let Err(error) = context.respond(self.build_response_data()).await {
            self.inner.view.stop();
            return Err(error.into());
        }

        Ok(())
    }

    /// Shows the given screen on top of the current one.
    pub async fn push(&self, screen: Screen) -> Result<(), MenuError> {
        let leaving = self.save_current()?;
        self.dispose(&leaving).await;

        self.show(&screen)?;
        debug!(
            "Menu [{}] pushed screen [{}]",
            self.inner.view.id(),
            screen.name
        );
        self.inner.stack.lock().push(screen);

        self.update_message(None).await?;
        Ok(())
    }

    /// Goes back to the previous screen.
    pub async fn pop(&self) -> Result<(), MenuError> {
        self.pop_count(1).await
    }

    /// Pops the given amount of screens, the root must remain on the stack.
    pub async fn pop_count(&self, count: usize) -> Result<(), MenuError> {
        let popped = {
            let mut stack = self.inner.stack.lock();
            let depth = stack.len();

            if depth == 0 {
                return Err(LifecycleError::EmptyStack.into());
            }
            if count == 0 || count > depth {
                return Err(LifecycleError::InvalidPopCount {
                    requested: count,
                    depth,
                }
                .into());
            }
            if count == depth {
                return Err(LifecycleError::CannotPopRoot.into());
            }

            stack.split_off(depth - count)
        };

        for screen in popped.iter().rev() {
            self.dispose(screen).await;
        }

        let top = self.current_screen().ok_or(LifecycleError::EmptyStack)?;
        self.show(&top)?;
        debug!(
            "Menu [{}] popped {} screens, showing [{}]",
            self.inner.view.id(),
            count,
            top.name
        );

        self.update_message(None).await?;
        Ok(())
    }

    /// Pops every screen but the root.
    pub async fn pop_until_root(&self) -> Result<(), MenuError> {
        match self.depth() {
            0 => Err(LifecycleError::EmptyStack.into()),
            1 => Ok(()),
            depth => self.pop_count(depth - 1).await,
        }
    }

    /// Edits the menu message with the current items, replacing the content of the
    /// current screen if one is given.
    ///
    /// Does nothing if the menu was not sent yet.
    pub async fn update_message(&self, content: Option<ScreenContent>) -> Result<(), ResponseError> {
        if let Some(content) = content {
            if let Some(top) = self.inner.stack.lock().last_mut() {
                top.content = content.clone();
            }
            *self.inner.content.lock() = content;
        }

        let Some(context) = self.inner.view.last_context() else {
            return Ok(());
        };

        context.edit_response(self.build_response_data()).await?;
        Ok(())
    }

    /// Replaces the view's items with the ones of the given screen.
    fn show(&self, screen: &Screen) -> Result<(), LayoutError> {
        let view = &self.inner.view;
        view.clear_items();

        for (item, callback) in &screen.items {
            let callback = callback.as_ref().map(|callback| self.wrap(callback.clone()));
            view.insert(item.clone(), callback)?;
        }

        *self.inner.content.lock() = screen.content.clone();
        Ok(())
    }

    /// Writes the state of the view's items back into the current screen.
    fn save_current(&self) -> Result<Screen, LifecycleError> {
        let mut stack = self.inner.stack.lock();
        let top = stack.last_mut().ok_or(LifecycleError::EmptyStack)?;

        for (item, _) in top.items.iter_mut() {
            let current = item
                .custom_id()
                .and_then(|custom_id| self.inner.view.item(custom_id));
            if let Some(current) = current {
                *item = current;
            }
        }

        Ok(top.clone())
    }

    async fn dispose(&self, screen: &Screen) {
        if let Some(hook) = &screen.on_dispose {
            if let Err(error) = hook.call().await {
                warn!(
                    "Screen [{}] of menu [{}] failed to dispose: {}",
                    screen.name,
                    self.inner.view.id(),
                    error
                );
            }
        }
    }

    fn wrap(&self, callback: ScreenCallback) -> ViewCallback {
        let menu = Arc::downgrade(&self.inner);
        ItemCallback::new(move |context: ViewContext, item: ViewItem| {
            let menu = menu.upgrade().map(|inner| Menu { inner });
            let callback = callback.clone();
            async move {
                match menu {
                    Some(menu) => callback.call(MenuContext::new(context, menu), item).await,
                    None => Ok(()),
                }
            }
        })
    }

    async fn on_timeout(&self) {
        self.inner.view.set_disabled_all(true);
        if let Err(error) = self.update_message(None).await {
            warn!(
                "Failed to disable the items of menu [{}]: {}",
                self.inner.view.id(),
                error
            );
        }
    }
}

/// A builder used to set the options of a [menu](Menu).
pub struct MenuBuilder {
    timeout: Option<Duration>,
    autodefer: AutodeferOptions,
}

impl Default for MenuBuilder {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            autodefer: AutodeferOptions::default(),
        }
    }
}

impl MenuBuilder {
    /// Sets how long the menu waits for interactions, `None` disables the timeout.
    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn autodefer(mut self, autodefer: impl Into<AutodeferOptions>) -> Self {
        self.autodefer = autodefer.into();
        self
    }

    pub fn build(self) -> Menu {
        let inner = Arc::new_cyclic(|menu: &Weak<MenuInner>| {
            let menu = menu.clone();
            let view = View::builder()
                .timeout(self.timeout)
                .autodefer(self.autodefer)
                .transient()
                .on_timeout(move |_| {
                    let menu = menu.upgrade().map(|inner| Menu { inner });
                    async move {
                        if let Some(menu) = menu {
                            menu.on_timeout().await;
                        }
                        Ok(())
                    }
                })
                .build();

            MenuInner {
                view,
                stack: Mutex::new(Vec::new()),
                content: Mutex::new(ScreenContent::default()),
                ephemeral: AtomicBool::new(false),
            }
        });

        Menu { inner }
    }
}
