//! Modals, popup forms made of text inputs.

use crate::{
    client::{Client, Transport},
    context::{AutodeferOptions, Context, ModalContext},
    error::{BuildError, ComponentError, LayoutError},
    event::{EventKind, EventPayload, InteractionEvent},
    handler::{Handler, HandlerCore, HandlerId, HandlerState, ItemSet},
    hook::{CheckHook, ErrorHandlerHook, TimeoutHook},
    item::{resolve_custom_id, validate_length, Item},
    response::ResponseState,
    text_input::TextInput,
    twilight_exports::{
        Component, InteractionResponse, InteractionResponseData, InteractionResponseType,
    },
    BoxFuture, CallbackResult, DefaultError,
};
use parking_lot::Mutex;
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tracing::{debug, error};

/// The maximum length of a modal title.
pub const MODAL_TITLE_LENGTH: usize = 45;

/// The timeout modals use unless told otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// The values submitted with a modal, keyed by the custom id of their text input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModalValues {
    values: Arc<HashMap<String, String>>,
}

impl ModalValues {
    pub fn get(&self, custom_id: &str) -> Option<&str> {
        self.values.get(custom_id).map(String::as_str)
    }

    /// The value submitted for the given text input.
    pub fn get_input(&self, input: &TextInput) -> Option<&str> {
        input.custom_id().and_then(|custom_id| self.get(custom_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(custom_id, value)| (custom_id.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type ModalCallback = Arc<dyn Fn(ModalContext) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

struct ModalInner {
    core: HandlerCore,
    title: String,
    custom_id: String,
    custom_id_persistent: bool,
    items: Mutex<ItemSet<TextInput, ModalContext>>,
    autodefer: AutodeferOptions,
    callback: Option<ModalCallback>,
    check: Option<CheckHook<ModalContext>>,
    on_timeout: Option<TimeoutHook<Modal>>,
    on_error: Option<ErrorHandlerHook<ModalContext>>,
    values: Mutex<Option<ModalValues>>,
    last_context: Mutex<Option<Context>>,
}

/// A form shown in response to an interaction, it stops after its first submission.
#[derive(Clone)]
pub struct Modal {
    inner: Arc<ModalInner>,
}

impl Modal {
    /// Creates a new [modal builder](ModalBuilder) with the given title.
    pub fn builder(title: impl Into<String>) -> ModalBuilder {
        ModalBuilder::new(title.into())
    }

    pub fn id(&self) -> HandlerId {
        self.inner.core.id()
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    pub fn custom_id(&self) -> &str {
        &self.inner.custom_id
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.inner.core.timeout()
    }

    pub fn state(&self) -> HandlerState {
        self.inner.core.state()
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == HandlerState::Stopped
    }

    /// Whether the modal can outlive a restart, which requires no timeout and every
    /// custom id to be supplied by the user.
    pub fn is_persistent(&self) -> bool {
        self.timeout().is_none()
            && self.inner.custom_id_persistent
            && self.inner.items.lock().is_persistent()
    }

    pub fn add_item(&self, input: TextInput) -> Result<(), LayoutError> {
        self.inner.items.lock().add(input, None)
    }

    pub fn remove_item(&self, custom_id: &str) -> Option<TextInput> {
        self.inner.items.lock().remove(custom_id)
    }

    pub fn clear_items(&self) -> Vec<TextInput> {
        self.inner.items.lock().clear()
    }

    pub fn item(&self, custom_id: &str) -> Option<TextInput> {
        self.inner
            .items
            .lock()
            .get(custom_id)
            .map(|slot| slot.item.clone())
    }

    pub fn items(&self) -> Vec<TextInput> {
        self.inner.items.lock().items()
    }

    /// The values of the last submission.
    pub fn values(&self) -> Option<ModalValues> {
        self.inner.values.lock().clone()
    }

    pub fn last_context(&self) -> Option<Context> {
        self.inner.last_context.lock().clone()
    }

    /// Renders the text inputs as action rows.
    pub fn build(&self) -> Vec<Component> {
        self.inner.items.lock().build()
    }

    /// The response showing this modal to the user.
    pub fn build_response(&self) -> InteractionResponse {
        InteractionResponse {
            kind: InteractionResponseType::Modal,
            data: Some(InteractionResponseData {
                custom_id: Some(self.inner.custom_id.clone()),
                title: Some(self.inner.title.clone()),
                components: Some(self.build()),
                ..Default::default()
            }),
        }
    }

    /// Stops listening for the submission.
    pub fn stop(&self) {
        if !self.inner.core.claim_stop() {
            return;
        }

        debug!("Stopping modal [{}]", self.id());
        self.teardown(false);
        self.inner.core.signal_stopped();
    }

    pub async fn wait(&self) {
        self.inner.core.wait().await
    }

    pub async fn wait_timeout(&self, duration: Duration) -> bool {
        self.inner.core.wait_timeout(duration).await
    }

    pub(crate) fn start_timeout(&self) {
        let modal = Arc::downgrade(&self.inner);
        self.inner.core.start_timeout(move || async move {
            if let Some(inner) = modal.upgrade() {
                Modal { inner }.handle_timeout().await;
            }
        });
    }

    async fn handle_timeout(&self) {
        if !self.inner.core.claim_stop() {
            return;
        }

        debug!("Modal [{}] timed out", self.id());
        self.teardown(true);

        if let Some(hook) = &self.inner.on_timeout {
            if let Err(error) = hook.call(self.clone()).await {
                self.report_error(error, None).await;
            }
        }

        self.inner.core.signal_stopped();
    }

    fn teardown(&self, from_timeout: bool) {
        if let Some(client) = self.inner.core.client() {
            client.unregister(self.id());
        }
        self.inner.core.shutdown(from_timeout);
    }

    async fn run(&self, context: ModalContext) {
        let passed = match &self.inner.check {
            Some(check) => check.call(context.clone()).await,
            None => true,
        };

        if !passed {
            debug!(
                "Modal [{}] check rejected interaction [{}]",
                self.id(),
                context.event().id
            );
            context.release();
            return;
        }

        for slot in self.inner.items.lock().slots_mut() {
            slot.item.refresh(context.event());
        }

        let result = match &self.inner.callback {
            Some(callback) => callback(context.clone()).await,
            None => Ok(()),
        };

        match result {
            Ok(()) => self.stop(),
            Err(error) => self.report_error(error, Some(context.clone())).await,
        }

        context.release();
    }

    async fn report_error(&self, error: DefaultError, context: Option<ModalContext>) {
        match &self.inner.on_error {
            Some(hook) => hook.call(error, context).await,
            None => error!("Ignoring error in modal [{}]: {}", self.id(), error),
        }
    }
}

impl Handler for Modal {
    fn core(&self) -> &HandlerCore {
        &self.inner.core
    }

    fn describe(&self) -> &'static str {
        "Modal"
    }

    fn custom_ids(&self) -> Vec<String> {
        vec![self.inner.custom_id.clone()]
    }

    fn invoke(&self, client: &Client, event: InteractionEvent, state: Arc<ResponseState>) -> bool {
        if event.kind() != EventKind::ModalSubmit
            || event.custom_id != self.inner.custom_id
            || self.state() != HandlerState::Listening
        {
            return false;
        }

        let EventPayload::Modal { fields } = &event.payload else {
            return false;
        };

        let values = {
            let items = self.inner.items.lock();
            fields
                .iter()
                .filter(|field| items.get(&field.custom_id).is_some())
                .map(|field| {
                    (
                        field.custom_id.clone(),
                        field.value.clone().unwrap_or_default(),
                    )
                })
                .collect::<HashMap<_, _>>()
        };
        if values.is_empty() {
            debug!(
                "Modal [{}] has no input matching the fields of interaction [{}]",
                self.id(),
                event.id
            );
            return false;
        }

        self.inner.core.refresh_timeout();
        let values = ModalValues {
            values: Arc::new(values),
        };
        *self.inner.values.lock() = Some(values.clone());

        debug!(
            "Dispatching interaction [{}] to modal [{}]",
            event.id,
            self.id()
        );

        let context = Context::new(client.clone(), event, state);
        *self.inner.last_context.lock() = Some(context.clone());
        if client.transport() == Transport::Push {
            context.spawn_autodefer(self.inner.autodefer);
        }

        let modal = self.clone();
        let context = ModalContext::new(context, self.clone(), values);
        self.inner.core.spawn(async move { modal.run(context).await });
        true
    }

    fn stop(&self) {
        Modal::stop(self)
    }
}

/// A builder used to create [modals](Modal).
pub struct ModalBuilder {
    title: String,
    custom_id: Option<String>,
    timeout: Option<Duration>,
    autodefer: AutodeferOptions,
    items: Vec<TextInput>,
    callback: Option<ModalCallback>,
    check: Option<CheckHook<ModalContext>>,
    on_timeout: Option<TimeoutHook<Modal>>,
    on_error: Option<ErrorHandlerHook<ModalContext>>,
}

impl ModalBuilder {
    fn new(title: String) -> Self {
        Self {
            title,
            custom_id: None,
            timeout: Some(DEFAULT_TIMEOUT),
            autodefer: AutodeferOptions::default(),
            items: Vec::new(),
            callback: None,
            check: None,
            on_timeout: None,
            on_error: None,
        }
    }

    /// Sets the custom id of the modal, needed for it to be persistent.
    pub fn custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = Some(custom_id.into());
        self
    }

    /// Sets how long the modal waits for a submission, `None` disables the timeout.
    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn autodefer(mut self, autodefer: impl Into<AutodeferOptions>) -> Self {
        self.autodefer = autodefer.into();
        self
    }

    pub fn item(mut self, input: TextInput) -> Self {
        self.items.push(input);
        self
    }

    /// Sets the function executed when the modal is submitted.
    pub fn callback<F, Fut>(mut self, fun: F) -> Self
    where
        F: Fn(ModalContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.callback = Some(Arc::new(
            move |context| -> BoxFuture<'static, CallbackResult> { Box::pin(fun(context)) },
        ));
        self
    }

    pub fn check<F, Fut>(mut self, fun: F) -> Self
    where
        F: Fn(ModalContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.check = Some(CheckHook::new(fun));
        self
    }

    pub fn on_timeout<F, Fut>(mut self, fun: F) -> Self
    where
        F: Fn(Modal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.on_timeout = Some(TimeoutHook::new(fun));
        self
    }

    pub fn on_error<F, Fut>(mut self, fun: F) -> Self
    where
        F: Fn(DefaultError, Option<ModalContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(ErrorHandlerHook::new(fun));
        self
    }

    pub fn build(self) -> Result<Modal, BuildError> {
        validate_length("title", Some(&self.title), MODAL_TITLE_LENGTH)?;
        if self.title.is_empty() {
            return Err(ComponentError::Empty { field: "title" }.into());
        }

        let (custom_id, custom_id_persistent) = resolve_custom_id(self.custom_id)?;
        let mut items = ItemSet::new();
        for input in self.items {
            items.add(input, None)?;
        }

        Ok(Modal {
            inner: Arc::new(ModalInner {
                core: HandlerCore::new(self.timeout),
                title: self.title,
                custom_id,
                custom_id_persistent,
                items: Mutex::new(items),
                autodefer: self.autodefer,
                callback: self.callback,
                check: self.check,
                on_timeout: self.on_timeout,
                on_error: self.on_error,
                values: Mutex::new(None),
                last_context: Mutex::new(None),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::SubmittedField,
        responder::testing::{Call, RecordingResponder},
        twilight_exports::Id,
    };
    use tokio::sync::mpsc;

    fn submission(custom_id: &str, name: &str) -> InteractionEvent {
        InteractionEvent::modal_submit(
            Id::new(1),
            Id::new(2),
            "token",
            custom_id,
            vec![SubmittedField {
                custom_id: "name".to_owned(),
                value: Some(name.to_owned()),
            }],
        )
    }

    fn name_input() -> TextInput {
        TextInput::short("Name").custom_id("name").build().unwrap()
    }

    #[test]
    fn titles_are_validated() {
        assert!(Modal::builder("a".repeat(46)).build().is_err());
        assert!(Modal::builder("").build().is_err());
        assert!(Modal::builder("a".repeat(45)).build().is_ok());
    }

    #[test]
    fn persistence_needs_every_custom_id() {
        let modal = Modal::builder("Form")
            .custom_id("form")
            .timeout(None)
            .item(name_input())
            .build()
            .unwrap();
        assert!(modal.is_persistent());

        let anonymous = Modal::builder("Form")
            .timeout(None)
            .item(name_input())
            .build()
            .unwrap();
        assert!(!anonymous.is_persistent());
        assert_eq!(anonymous.custom_id().len(), 32);
    }

    #[test]
    fn response_carries_the_form() {
        let modal = Modal::builder("Form")
            .custom_id("form")
            .item(name_input())
            .item(TextInput::paragraph("Bio").custom_id("bio").build().unwrap())
            .build()
            .unwrap();

        let response = modal.build_response();
        assert_eq!(response.kind, InteractionResponseType::Modal);

        let data = response.data.unwrap();
        assert_eq!(data.custom_id.as_deref(), Some("form"));
        assert_eq!(data.title.as_deref(), Some("Form"));
        assert_eq!(data.components.map(|rows| rows.len()), Some(2));
    }

    #[tokio::test]
    async fn submission_runs_callback_once_and_stops() {
        let responder = RecordingResponder::default();
        let client = Client::builder(responder.clone()).build();
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let modal = Modal::builder("Form")
            .custom_id("form")
            .item(name_input())
            .callback(move |ctx| {
                let sender = sender.clone();
                async move {
                    let _ = sender.send(ctx.value("name").map(ToOwned::to_owned));
                    ctx.defer(false).await?;
                    Ok(())
                }
            })
            .build()
            .unwrap();

        client.start_modal(&modal).unwrap();
        client.dispatch(submission("form", "Ferris")).await.unwrap();
        modal.wait().await;

        assert_eq!(receiver.recv().await, Some(Some("Ferris".to_owned())));
        assert_eq!(modal.values().unwrap().get("name"), Some("Ferris"));
        assert_eq!(modal.item("name").unwrap().value(), Some("Ferris"));
        assert!(modal.is_stopped());
        assert!(matches!(responder.calls().as_slice(), [Call::Create(_)]));

        assert_eq!(
            client.dispatch(submission("form", "Again")).await,
            Ok(crate::client::ProcessResult::Unhandled)
        );
    }

    #[tokio::test]
    async fn failed_submissions_keep_listening() {
        let client = Client::builder(RecordingResponder::default()).build();
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let modal = Modal::builder("Form")
            .item(name_input())
            .callback(|_| async { Err("invalid name".into()) })
            .on_error(move |error, _| {
                let sender = sender.clone();
                async move {
                    let _ = sender.send(error.to_string());
                }
            })
            .build()
            .unwrap();

        client.start_modal(&modal).unwrap();
        client
            .dispatch(submission(modal.custom_id(), "?"))
            .await
            .unwrap();

        assert_eq!(receiver.recv().await.as_deref(), Some("invalid name"));
        assert_eq!(modal.state(), HandlerState::Listening);
    }

    #[tokio::test]
    async fn submissions_without_known_fields_are_dropped() {
        let client = Client::builder(RecordingResponder::default()).build();
        let (sender, mut receiver) = mpsc::unbounded_channel::<()>();
        let modal = Modal::builder("Form")
            .custom_id("form")
            .item(name_input())
            .callback(move |_| {
                let sender = sender.clone();
                async move {
                    let _ = sender.send(());
                    Ok(())
                }
            })
            .build()
            .unwrap();
        client.start_modal(&modal).unwrap();

        let event = InteractionEvent::modal_submit(
            Id::new(1),
            Id::new(2),
            "token",
            "form",
            vec![SubmittedField {
                custom_id: "unrelated".to_owned(),
                value: Some("?".to_owned()),
            }],
        );

        assert_eq!(
            client.dispatch(event).await,
            Ok(crate::client::ProcessResult::Unhandled)
        );
        assert!(receiver.try_recv().is_err());
        assert_eq!(modal.state(), HandlerState::Listening);
        assert!(modal.values().is_none());
    }
}
