use crate::{
    client::Client,
    error::ResponseError,
    event::InteractionEvent,
    modal::{Modal, ModalValues},
    response::{Response, ResponseState},
    twilight_exports::*,
    view::View,
};
use parking_lot::Mutex;
use std::{ops::Deref, sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Controls whether interactions left unanswered are acknowledged automatically.
///
/// Only applies when the client sends responses over http, see
/// [Transport](crate::client::Transport).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutodeferOptions {
    pub enabled: bool,
    /// Whether the deferred response is only visible to the interaction author.
    pub ephemeral: bool,
    /// How long to wait for a response before deferring.
    pub after: Duration,
}

impl Default for AutodeferOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            ephemeral: false,
            after: Duration::from_secs(2),
        }
    }
}

impl From<bool> for AutodeferOptions {
    fn from(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }
}

/// Context given to every callback, it allows to respond the interaction that triggered it.
#[derive(Clone)]
pub struct Context {
    client: Client,
    event: Arc<InteractionEvent>,
    token: Arc<str>,
    state: Arc<ResponseState>,
    responses: Arc<Mutex<Vec<Response>>>,
}

impl Context {
    pub(crate) fn new(client: Client, event: InteractionEvent, state: Arc<ResponseState>) -> Self {
        Self {
            client,
            token: event.token.as_str().into(),
            event: Arc::new(event),
            state,
            responses: Default::default(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The event being handled.
    pub fn event(&self) -> &InteractionEvent {
        &self.event
    }

    pub fn custom_id(&self) -> &str {
        &self.event.custom_id
    }

    pub fn user_id(&self) -> Option<Id<UserMarker>> {
        self.event.user_id
    }

    pub fn guild_id(&self) -> Option<Id<GuildMarker>> {
        self.event.guild_id
    }

    pub fn channel_id(&self) -> Option<Id<ChannelMarker>> {
        self.event.channel_id
    }

    pub fn message_id(&self) -> Option<Id<MessageMarker>> {
        self.event.message_id
    }

    pub fn locale(&self) -> Option<&str> {
        self.event.locale.as_deref()
    }

    /// Whether the initial response was already issued.
    pub fn is_responded(&self) -> bool {
        self.state.is_issued()
    }

    /// Every message sent through this context, in order.
    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().clone()
    }

    /// Sends a message, as the initial response or as a followup if the interaction was
    /// already responded.
    pub async fn respond(&self, data: InteractionResponseData) -> Result<Response, ResponseError> {
        if self.state.claim() {
            self.deliver(InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(data),
            })
            .await?;
            return Ok(self.track(None));
        }

        let message_id = self
            .client
            .responder()
            .create_followup(&self.token, &data)
            .await?;
        Ok(self.track(Some(message_id)))
    }

    /// Sends a followup message, the interaction must have been responded first.
    pub async fn followup(&self, data: InteractionResponseData) -> Result<Response, ResponseError> {
        if !self.is_responded() {
            return Err(ResponseError::NotResponded);
        }

        let message_id = self
            .client
            .responder()
            .create_followup(&self.token, &data)
            .await?;
        Ok(self.track(Some(message_id)))
    }

    /// Sends the given initial response.
    pub async fn respond_with(&self, response: InteractionResponse) -> Result<Response, ResponseError> {
        if !self.state.claim() {
            return Err(ResponseError::AlreadyResponded);
        }

        self.deliver(response).await?;
        Ok(self.track(None))
    }

    /// Edits the message the component is attached to, or the initial response if the
    /// interaction was already responded.
    pub async fn edit_response(
        &self,
        data: InteractionResponseData,
    ) -> Result<Response, ResponseError> {
        if self.state.claim() {
            self.deliver(InteractionResponse {
                kind: InteractionResponseType::UpdateMessage,
                data: Some(data),
            })
            .await?;
        } else {
            self.client
                .responder()
                .update_response(&self.token, &data)
                .await?;
        }

        Ok(Response::new(
            Arc::clone(self.client.responder()),
            Arc::clone(&self.token),
            None,
        ))
    }

    /// Acknowledges the interaction, allowing to respond later.
    ///
    /// Ephemeral defers show a loading message only the author can see, the rest defer an
    /// update of the message the component is attached to.
    pub async fn defer(&self, ephemeral: bool) -> Result<(), ResponseError> {
        if !self.state.claim() {
            return Err(ResponseError::AlreadyResponded);
        }

        let response = if ephemeral {
            InteractionResponse {
                kind: InteractionResponseType::DeferredChannelMessageWithSource,
                data: Some(InteractionResponseData {
                    flags: Some(MessageFlags::EPHEMERAL),
                    ..Default::default()
                }),
            }
        } else {
            InteractionResponse {
                kind: InteractionResponseType::DeferredUpdateMessage,
                data: None,
            }
        };

        self.deliver(response).await
    }

    /// Shows the given modal to the user and starts listening for its submission.
    pub async fn respond_with_modal(&self, modal: &Modal) -> Result<(), ResponseError> {
        self.client.start_modal(modal)?;

        if !self.state.claim() {
            modal.stop();
            return Err(ResponseError::AlreadyResponded);
        }

        if let Err(error) = self.deliver(modal.build_response()).await {
            modal.stop();
            return Err(error);
        }

        Ok(())
    }

    /// Deletes the initial response.
    pub async fn delete_response(&self) -> Result<(), ResponseError> {
        self.client.responder().delete_response(&self.token).await
    }

    async fn deliver(&self, response: InteractionResponse) -> Result<(), ResponseError> {
        self.state
            .deliver(
                self.client.responder().as_ref(),
                self.event.id,
                &self.token,
                response,
            )
            .await
    }

    fn track(&self, message_id: Option<Id<MessageMarker>>) -> Response {
        let response = Response::new(
            Arc::clone(self.client.responder()),
            Arc::clone(&self.token),
            message_id,
        );
        self.responses.lock().push(response.clone());
        response
    }

    /// Closes the pull channel once no callback can respond anymore.
    pub(crate) fn release(&self) {
        self.state.release();
    }

    /// Defers the interaction if nothing responded it once the configured delay elapses.
    pub(crate) fn spawn_autodefer(&self, options: AutodeferOptions) {
        if !options.enabled {
            return;
        }

        let context = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(options.after).await;
            if context.is_responded() {
                return;
            }

            debug!("Automatically deferring interaction [{}]", context.event.id);
            match context.defer(options.ephemeral).await {
                Ok(()) | Err(ResponseError::AlreadyResponded) => {}
                Err(error) => warn!(
                    "Failed to automatically defer interaction [{}]: {}",
                    context.event.id, error
                ),
            }
        });
    }
}

/// Context given to view callbacks.
#[derive(Clone)]
pub struct ViewContext {
    context: Context,
    view: View,
}

impl ViewContext {
    pub(crate) fn new(context: Context, view: View) -> Self {
        Self { context, view }
    }

    /// The view the interaction was dispatched to.
    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

impl Deref for ViewContext {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// Context given to modal callbacks.
#[derive(Clone)]
pub struct ModalContext {
    context: Context,
    modal: Modal,
    values: ModalValues,
}

impl ModalContext {
    pub(crate) fn new(context: Context, modal: Modal, values: ModalValues) -> Self {
        Self {
            context,
            modal,
            values,
        }
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    /// The values submitted with the modal.
    pub fn values(&self) -> &ModalValues {
        &self.values
    }

    /// The submitted value of the text input with the given custom id.
    pub fn value(&self, custom_id: &str) -> Option<&str> {
        self.values.get(custom_id)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

impl Deref for ModalContext {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}
