//! Navigators, views paginating a list of pages with a row of buttons.

use crate::{
    button::Button,
    client::Bind,
    context::{AutodeferOptions, Context, ModalContext, ViewContext},
    error::{BuildError, ComponentError, LifecycleError, MenuError, ResponseError},
    hook::ItemCallback,
    item::{random_custom_id, ViewItem},
    modal::Modal,
    text_input::TextInput,
    twilight_exports::{ButtonStyle, Component, Embed, InteractionResponseData, MessageFlags},
    view::{View, ViewCallback},
    CallbackResult, HandlerState,
};
use std::{
    future::Future,
    ops::Deref,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Weak,
    },
    time::Duration,
};
use tracing::{debug, warn};
use twilight_util::builder::InteractionResponseDataBuilder;

/// The timeout navigators use unless told otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// The custom id of the text input of the page jump modal.
const PAGE_INPUT: &str = "page";

/// A single page shown by a [navigator](Navigator).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl Page {
    pub fn new(content: Option<String>, embeds: Vec<Embed>) -> Self {
        Self { content, embeds }
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn embeds(&self) -> &[Embed] {
        &self.embeds
    }

    fn to_data(&self, components: Vec<Component>, ephemeral: bool) -> InteractionResponseData {
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

impl From<&str> for Page {
    fn from(content: &str) -> Self {
        Self::new(Some(content.to_owned()), Vec::new())
    }
}

impl From<String> for Page {
    fn from(content: String) -> Self {
        Self::new(Some(content), Vec::new())
    }
}

impl From<Embed> for Page {
    fn from(embed: Embed) -> Self {
        Self::new(None, vec![embed])
    }
}

impl From<Vec<Embed>> for Page {
    fn from(embeds: Vec<Embed>) -> Self {
        Self::new(None, embeds)
    }
}

/// The buttons a navigator can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavButton {
    First,
    Prev,
    /// Shows the current page, clicking it asks for a page to jump to.
    Indicator,
    Next,
    Last,
    /// Disables every button and stops the navigator.
    Stop,
}

impl NavButton {
    /// The buttons used when none are specified.
    pub const DEFAULT: [NavButton; 5] = [
        NavButton::First,
        NavButton::Prev,
        NavButton::Indicator,
        NavButton::Next,
        NavButton::Last,
    ];

    fn button(self, custom_id: String) -> Result<Button, ComponentError> {
        let (label, style) = match self {
            Self::First => ("⏪", ButtonStyle::Primary),
            Self::Prev => ("◀", ButtonStyle::Primary),
            Self::Indicator => ("1/1", ButtonStyle::Secondary),
            Self::Next => ("▶", ButtonStyle::Primary),
            Self::Last => ("⏩", ButtonStyle::Primary),
            Self::Stop => ("⏹", ButtonStyle::Danger),
        };

        Button::builder()
            .label(label)
            .style(style)
            .custom_id(custom_id)
            .build()
    }
}

/// A callback attached to a custom navigator item.
pub type NavCallback = ItemCallback<NavContext, ViewItem>;

/// Context given to the callbacks of custom navigator items.
#[derive(Clone)]
pub struct NavContext {
    context: ViewContext,
    navigator: Navigator,
}

impl NavContext {
    /// The navigator the item belongs to.
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }
}

impl Deref for NavContext {
    type Target = ViewContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

struct NavigatorInner {
    view: View,
    pages: Vec<Page>,
    buttons: Vec<(String, NavButton)>,
    current: AtomicUsize,
    ephemeral: AtomicBool,
}

/// A view that paginates a list of [pages](Page).
///
/// Once sent, the navigator lives as long as its view listens.
#[derive(Clone)]
pub struct Navigator {
    inner: Arc<NavigatorInner>,
}

impl Navigator {
    /// Creates a new [navigator builder](NavigatorBuilder) for the given pages.
    pub fn builder<P: Into<Page>>(pages: impl IntoIterator<Item = P>) -> NavigatorBuilder {
        NavigatorBuilder {
            pages: pages.into_iter().map(Into::into).collect(),
            buttons: NavButton::DEFAULT.to_vec(),
            items: Vec::new(),
            start_page: 0,
            timeout: Some(DEFAULT_TIMEOUT),
            autodefer: AutodeferOptions::default(),
        }
    }

    /// The view rendering the navigation buttons.
    pub fn view(&self) -> &View {
        &self.inner.view
    }

    pub fn pages(&self) -> &[Page] {
        &self.inner.pages
    }

    /// The index of the page being shown.
    pub fn current_page(&self) -> usize {
        self.inner.current.load(Ordering::Acquire)
    }

    /// The custom id given to the given button, if the navigator shows it.
    pub fn custom_id(&self, button: NavButton) -> Option<&str> {
        self.inner
            .buttons
            .iter()
            .find(|(_, kind)| *kind == button)
            .map(|(custom_id, _)| custom_id.as_str())
    }

    /// The current page along with the navigation buttons.
    pub fn build_response_data(&self) -> InteractionResponseData {
        let page = &self.inner.pages[self.current_page()];
        page.to_data(
            self.inner.view.build(),
            self.inner.ephemeral.load(Ordering::Relaxed),
        )
    }

    /// Starts listening and sends the current page in response to the given interaction.
    pub async fn send(&self, context: &Context, ephemeral: bool) -> Result<(), MenuError> {
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

    /// Sends the navigator starting from the page at the given index.
    pub async fn send_page(
        &self,
        context: &Context,
        index: usize,
        ephemeral: bool,
    ) -> Result<(), MenuError> {
        if self.inner.view.state() != HandlerState::Created {
            return Err(LifecycleError::AlreadyStarted.into());
        }

        let index = index.min(self.inner.pages.len() - 1);
        self.inner.current.store(index, Ordering::Release);
        self.refresh_buttons();
        self.send(context, ephemeral).await
    }

    /// Shows the page at the given index, clamped to the available pages.
    ///
    /// The message is edited if the navigator was already sent.
    pub async fn set_page(&self, index: usize) -> Result<(), ResponseError> {
        let index = index.min(self.inner.pages.len() - 1);
        self.inner.current.store(index, Ordering::Release);
        self.refresh_buttons();

        debug!(
            "Navigator [{}] is now showing page {}",
            self.inner.view.id(),
            index + 1
        );

        self.update_message().await
    }

    async fn update_message(&self) -> Result<(), ResponseError> {
        let Some(context) = self.inner.view.last_context() else {
            return Ok(());
        };

        context.edit_response(self.build_response_data()).await?;
        Ok(())
    }

    fn refresh_buttons(&self) {
        let current = self.current_page();
        let last = self.inner.pages.len() - 1;

        for (custom_id, kind) in &self.inner.buttons {
            self.inner.view.edit_item(custom_id, |item| {
                let Some(button) = item.as_button_mut() else {
                    return;
                };

                match kind {
                    NavButton::First | NavButton::Prev => button.set_disabled(current == 0),
                    NavButton::Next | NavButton::Last => button.set_disabled(current == last),
                    NavButton::Indicator => {
                        if let Err(error) = button.set_label(format!("{}/{}", current + 1, last + 1)) {
                            warn!("Failed to update the page indicator: {}", error);
                        }
                        button.set_disabled(last == 0);
                    }
                    NavButton::Stop => {}
                }
            });
        }
    }

    async fn handle(&self, button: NavButton, context: ViewContext) -> CallbackResult {
        let current = self.current_page();

        match button {
            NavButton::First => self.set_page(0).await?,
            NavButton::Prev => self.set_page(current.saturating_sub(1)).await?,
            NavButton::Next => self.set_page(current + 1).await?,
            NavButton::Last => self.set_page(usize::MAX).await?,
            NavButton::Indicator => self.ask_page(&context).await?,
            NavButton::Stop => {
                self.inner.view.set_disabled_all(true);
                self.update_message().await?;
                self.inner.view.stop();
            }
        }

        Ok(())
    }

    /// Shows a modal asking for the page to jump to.
    async fn ask_page(&self, context: &ViewContext) -> CallbackResult {
        let navigator = self.clone();
        let modal = Modal::builder("Jump to page")
            .item(
                TextInput::short("Page Number")
                    .custom_id(PAGE_INPUT)
                    .placeholder("Enter a page number to jump to it...")
                    .build()?,
            )
            .callback(move |context: ModalContext| {
                let navigator = navigator.clone();
                async move { navigator.jump(context).await }
            })
            .build()?;

        context.respond_with_modal(&modal).await?;
        Ok(())
    }

    /// Jumps to the page submitted through the page jump modal, invalid pages are
    /// acknowledged without changing anything.
    async fn jump(&self, context: ModalContext) -> CallbackResult {
        self.inner.view.set_last_context(context.context().clone());

        let page = context
            .value(PAGE_INPUT)
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|page| *page > 0);

        match page {
            Some(page) => self.set_page(page - 1).await?,
            None => {
                debug!(
                    "Navigator [{}] received an invalid page number",
                    self.inner.view.id()
                );
                context.defer(false).await?
            }
        }

        Ok(())
    }

    fn wrap(&self, callback: NavCallback) -> ViewCallback {
        let navigator = Arc::downgrade(&self.inner);
        ItemCallback::new(move |context: ViewContext, item: ViewItem| {
            let navigator = navigator.upgrade().map(|inner| Navigator { inner });
            let callback = callback.clone();
            async move {
                match navigator {
                    Some(navigator) => {
                        callback
                            .call(NavContext { context, navigator }, item)
                            .await
                    }
                    None => Ok(()),
                }
            }
        })
    }

    async fn on_timeout(&self) {
        self.inner.view.set_disabled_all(true);
        if let Err(error) = self.update_message().await {
            warn!(
                "Failed to disable the buttons of navigator [{}]: {}",
                self.inner.view.id(),
                error
            );
        }
    }
}

/// A builder used to set the options of a [navigator](Navigator).
pub struct NavigatorBuilder {
    pages: Vec<Page>,
    buttons: Vec<NavButton>,
    items: Vec<(ViewItem, Option<NavCallback>)>,
    start_page: usize,
    timeout: Option<Duration>,
    autodefer: AutodeferOptions,
}

impl NavigatorBuilder {
    /// Sets the buttons shown below the pages, in order.
    pub fn buttons(mut self, buttons: impl IntoIterator<Item = NavButton>) -> Self {
        self.buttons = buttons.into_iter().collect();
        self
    }

    /// Adds a custom item shown after the navigation buttons.
    pub fn item<F, Fut>(mut self, item: impl Into<ViewItem>, callback: F) -> Self
    where
        F: Fn(NavContext, ViewItem) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.items
            .push((item.into(), Some(ItemCallback::new(callback))));
        self
    }

    /// Adds an item without a callback, such as a link button.
    pub fn bare_item(mut self, item: impl Into<ViewItem>) -> Self {
        self.items.push((item.into(), None));
        self
    }

    /// Sets the page shown first, clamped to the available pages.
    pub fn start_page(mut self, start_page: usize) -> Self {
        self.start_page = start_page;
        self
    }

    /// Sets how long the navigator waits for interactions, `None` disables the timeout.
    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn autodefer(mut self, autodefer: impl Into<AutodeferOptions>) -> Self {
        self.autodefer = autodefer.into();
        self
    }

    pub fn build(self) -> Result<Navigator, BuildError> {
        if self.pages.is_empty() {
            return Err(ComponentError::NoPages.into());
        }

        let mut buttons = Vec::with_capacity(self.buttons.len());
        let mut items = Vec::with_capacity(self.buttons.len());
        for kind in self.buttons {
            if buttons.iter().any(|(_, existing)| *existing == kind) {
                continue;
            }

            let custom_id = random_custom_id();
            items.push((kind, kind.button(custom_id.clone())?));
            buttons.push((custom_id, kind));
        }

        let start_page = self.start_page.min(self.pages.len() - 1);
        let timeout = self.timeout;
        let autodefer = self.autodefer;
        let pages = self.pages;
        let custom_items = self.items;

        let inner = Arc::new_cyclic(|navigator: &Weak<NavigatorInner>| {
            let weak = navigator.clone();
            let view = View::builder()
                .timeout(timeout)
                .autodefer(autodefer)
                .transient()
                .on_timeout(move |_| {
                    let navigator = weak.upgrade().map(|inner| Navigator { inner });
                    async move {
                        if let Some(navigator) = navigator {
                            navigator.on_timeout().await;
                        }
                        Ok(())
                    }
                })
                .build();

            NavigatorInner {
                view,
                pages,
                buttons,
                current: AtomicUsize::new(start_page),
                ephemeral: AtomicBool::new(false),
            }
        });

        let navigator = Navigator { inner };
        for (kind, button) in items {
            let weak = Arc::downgrade(&navigator.inner);
            navigator.inner.view.add_item(button, move |context: ViewContext, _: ViewItem| {
                let navigator = weak.upgrade().map(|inner| Navigator { inner });
                async move {
                    match navigator {
                        Some(navigator) => navigator.handle(kind, context).await,
                        None => Ok(()),
                    }
                }
            })?;
        }
        for (item, callback) in custom_items {
            let callback = callback.map(|callback| navigator.wrap(callback));
            navigator.inner.view.insert(item, callback)?;
        }
        navigator.refresh_buttons();

        Ok(navigator)
    }
}

/// Splits long text into pages of a bounded length, breaking only between lines.
///
/// Every page starts with the prefix and ends with the suffix, lengths count characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paginator {
    max_len: usize,
    prefix: String,
    suffix: String,
    line_separator: String,
    pages: Vec<String>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Paginator {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            prefix: String::new(),
            suffix: String::new(),
            line_separator: "\n".to_owned(),
            pages: Vec::new(),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Sets the text separating lines, defaults to a newline.
    pub fn line_separator(mut self, line_separator: impl Into<String>) -> Self {
        self.line_separator = line_separator.into();
        self
    }

    /// Adds the given text, splitting it into lines first.
    ///
    /// Fails if a single line, along with the prefix and suffix, can't fit in a page.
    /// Lines added before the failing one are kept.
    pub fn add_line(&mut self, text: &str) -> Result<(), ComponentError> {
        let separator = self.line_separator.clone();
        for line in text.split(separator.as_str()) {
            self.push_line(line)?;
        }
        Ok(())
    }

    fn push_line(&mut self, line: &str) -> Result<(), ComponentError> {
        let tail = line.chars().count()
            + self.line_separator.chars().count()
            + self.suffix.chars().count();
        let len = self.prefix.chars().count() + tail;
        if len > self.max_len {
            return Err(ComponentError::LineTooLong {
                len,
                max: self.max_len,
            });
        }

        let fits = self
            .pages
            .last()
            .map_or(false, |page| page.chars().count() + tail <= self.max_len);
        if !fits {
            self.pages.push(self.prefix.clone());
        }

        if let Some(page) = self.pages.last_mut() {
            page.push_str(line);
            page.push_str(&self.line_separator);
        }
        Ok(())
    }

    /// The pages built so far, each one closed with the suffix.
    pub fn pages(&self) -> Vec<String> {
        self.pages
            .iter()
            .map(|page| format!("{page}{}", self.suffix))
            .collect()
    }
}
