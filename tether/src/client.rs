//! The dispatcher routing interactions to listening handlers.

use crate::{
    error::{LifecycleError, ProcessError},
    event::{EventKind, InteractionEvent},
    handler::{Binding, Handler, HandlerId},
    modal::Modal,
    responder::{HttpResponder, Responder, WrappedClient},
    response::ResponseState,
    twilight_exports::*,
    view::View,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};
use tracing::{debug, info, warn};

/// How initial responses reach Discord.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Transport {
    /// Responses are sent over http, used with the gateway.
    #[default]
    Push,
    /// Responses are returned from [process](Client::process), used when receiving
    /// interactions through an http endpoint.
    Pull,
}

/// How a started view is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bind {
    /// Route by the message the view is attached to.
    Message(Id<MessageMarker>),
    /// Route by custom ids only, requires a persistent view.
    Unbound,
    /// Persistent views stay unbound, the rest are bound to the message of their first
    /// interaction.
    Auto,
}

/// The outcome of processing an interaction.
#[derive(Debug, PartialEq)]
pub enum ProcessResult {
    /// The interaction is not a component interaction nor a modal submission.
    Ignored,
    /// No listening handler was found for the interaction.
    Unhandled,
    /// The interaction was handed to a handler.
    Dispatched,
    /// The initial response issued by the handler, only when using [Transport::Pull].
    Responded(InteractionResponse),
}

type SharedHandler = Arc<dyn Handler>;

#[derive(Default)]
struct Registry {
    unbound: HashMap<String, SharedHandler>,
    bound: HashMap<Id<MessageMarker>, SharedHandler>,
}

impl Registry {
    fn claim_custom_ids(
        &mut self,
        handler: &SharedHandler,
        custom_ids: Vec<String>,
        displaced: &mut Vec<SharedHandler>,
    ) {
        for custom_id in custom_ids {
            if let Some(previous) = self.unbound.insert(custom_id, Arc::clone(handler)) {
                Self::displace(previous, handler, displaced);
            }
        }
    }

    fn claim_message(
        &mut self,
        handler: &SharedHandler,
        message_id: Id<MessageMarker>,
        displaced: &mut Vec<SharedHandler>,
    ) {
        if let Some(previous) = self.bound.insert(message_id, Arc::clone(handler)) {
            Self::displace(previous, handler, displaced);
        }
    }

    fn displace(previous: SharedHandler, by: &SharedHandler, displaced: &mut Vec<SharedHandler>) {
        let id = previous.core().id();
        if id != by.core().id() && !displaced.iter().any(|handler| handler.core().id() == id) {
            displaced.push(previous);
        }
    }

    fn release(&mut self, id: HandlerId) {
        self.unbound.retain(|_, handler| handler.core().id() != id);
        self.bound.retain(|_, handler| handler.core().id() != id);
    }

    fn owns_any(&self, id: HandlerId) -> bool {
        self.unbound
            .values()
            .chain(self.bound.values())
            .any(|handler| handler.core().id() == id)
    }
}

struct ClientInner {
    responder: Arc<dyn Responder>,
    transport: Transport,
    log_unhandled: bool,
    response_window: Duration,
    registry: Mutex<Registry>,
}

/// The entry point of the framework, it keeps track of listening handlers and routes
/// interactions to them.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

/// A reference to a client that doesn't keep it alive.
#[derive(Clone, Default)]
pub(crate) struct WeakClient(Weak<ClientInner>);

impl WeakClient {
    pub(crate) fn upgrade(&self) -> Option<Client> {
        self.0.upgrade().map(|inner| Client { inner })
    }
}

impl Client {
    /// Creates a new [builder](ClientBuilder) using the given responder.
    pub fn builder(responder: impl Responder) -> ClientBuilder {
        ClientBuilder::new(Arc::new(responder))
    }

    /// Creates a new [builder](ClientBuilder) responding through twilight's http client.
    pub fn http(
        http_client: impl Into<WrappedClient>,
        application_id: Id<ApplicationMarker>,
    ) -> ClientBuilder {
        Self::builder(HttpResponder::new(http_client, application_id))
    }

    pub fn transport(&self) -> Transport {
        self.inner.transport
    }

    pub fn responder(&self) -> &Arc<dyn Responder> {
        &self.inner.responder
    }

    pub(crate) fn downgrade(&self) -> WeakClient {
        WeakClient(Arc::downgrade(&self.inner))
    }

    /// Starts listening for interactions targeting the given view.
    pub fn start_view(&self, view: &View, bind: Bind) -> Result<(), LifecycleError> {
        let binding = match bind {
            Bind::Message(message_id) => Binding::Message(message_id),
            Bind::Unbound if !view.is_persistent() => return Err(LifecycleError::NotPersistent),
            Bind::Unbound => Binding::Unbound,
            Bind::Auto if view.is_persistent() => Binding::Unbound,
            Bind::Auto => Binding::Pending,
        };

        view.core().begin(self.downgrade(), binding)?;
        self.register(Arc::new(view.clone()));
        view.start_timeout();

        info!("Started view [{}] with binding {:?}", view.id(), binding);
        Ok(())
    }

    /// Starts listening for the submission of the given modal.
    pub fn start_modal(&self, modal: &Modal) -> Result<(), LifecycleError> {
        modal.core().begin(self.downgrade(), Binding::Unbound)?;
        self.register(Arc::new(modal.clone()));
        modal.start_timeout();

        info!("Started modal [{}]", modal.id());
        Ok(())
    }

    /// Stops a view started with this client.
    pub fn stop_view(&self, view: &View) -> Result<(), LifecycleError> {
        Self::stop_handler(view)
    }

    /// Stops a modal started with this client.
    pub fn stop_modal(&self, modal: &Modal) -> Result<(), LifecycleError> {
        Self::stop_handler(modal)
    }

    fn stop_handler(handler: &dyn Handler) -> Result<(), LifecycleError> {
        if handler.core().binding().is_none() {
            return Err(LifecycleError::NotStarted);
        }

        handler.stop();
        Ok(())
    }

    /// Gets the view bound to the given message.
    pub fn get_view(&self, message_id: Id<MessageMarker>) -> Option<View> {
        self.inner
            .registry
            .lock()
            .bound
            .get(&message_id)
            .and_then(|handler| handler.as_view())
    }

    /// Stops the handler bound to the given message, useful when the message is deleted.
    pub fn remove_message(&self, message_id: Id<MessageMarker>) {
        let handler = self.inner.registry.lock().bound.remove(&message_id);
        if let Some(handler) = handler {
            debug!(
                "Message [{}] was removed, stopping {} [{}]",
                message_id,
                handler.describe(),
                handler.core().id()
            );
            handler.stop();
        }
    }

    /// Stops every listening handler.
    pub fn close(&self) {
        let handlers = {
            let mut guard = self.inner.registry.lock();
            let registry = &mut *guard;
            let mut handlers: Vec<SharedHandler> = Vec::new();
            for handler in registry
                .unbound
                .drain()
                .map(|(_, handler)| handler)
                .chain(registry.bound.drain().map(|(_, handler)| handler))
            {
                if !handlers.iter().any(|h| h.core().id() == handler.core().id()) {
                    handlers.push(handler);
                }
            }
            handlers
        };

        info!("Closing client, stopping {} handlers", handlers.len());
        for handler in handlers {
            handler.stop();
        }
    }

    /// Processes the given interaction, dispatching it to the handler it targets.
    pub async fn process(&self, interaction: Interaction) -> Result<ProcessResult, ProcessError> {
        match interaction.kind {
            InteractionType::MessageComponent | InteractionType::ModalSubmit => {}
            _ => return Ok(ProcessResult::Ignored),
        }

        match InteractionEvent::from_interaction(&interaction) {
            Some(event) => self.dispatch(event).await,
            None => Ok(ProcessResult::Ignored),
        }
    }

    /// Dispatches an already converted event.
    ///
    /// When using [Transport::Pull] this waits until the handler issues the initial
    /// response, failing if it doesn't within the response window.
    pub async fn dispatch(&self, event: InteractionEvent) -> Result<ProcessResult, ProcessError> {
        let Some(handler) = self.resolve(&event) else {
            if self.inner.log_unhandled {
                warn!(
                    "No handler is listening for interaction [{}] with custom id [{}]",
                    event.id, event.custom_id
                );
            } else {
                debug!("Ignoring unhandled interaction [{}]", event.id);
            }
            return Ok(ProcessResult::Unhandled);
        };

        match self.inner.transport {
            Transport::Push => {
                if !handler.invoke(self, event, ResponseState::push()) {
                    return Ok(ProcessResult::Unhandled);
                }

                Ok(ProcessResult::Dispatched)
            }
            Transport::Pull => {
                let (state, receiver) = ResponseState::pull();
                if !handler.invoke(self, event, state) {
                    return Ok(ProcessResult::Unhandled);
                }

                match tokio::time::timeout(self.inner.response_window, receiver).await {
                    Ok(Ok(response)) => Ok(ProcessResult::Responded(response)),
                    _ => Err(ProcessError::NoResponseIssued),
                }
            }
        }
    }

    /// Finds the handler an event targets, binding pending views on their first event.
    fn resolve(&self, event: &InteractionEvent) -> Option<SharedHandler> {
        let mut displaced = Vec::new();
        let handler = {
            let mut registry = self.inner.registry.lock();

            let bound = match (event.kind(), event.message_id) {
                (EventKind::Component, Some(message_id)) => registry.bound.get(&message_id).cloned(),
                _ => None,
            };

            match bound {
                Some(handler) => Some(handler),
                None => {
                    let handler = registry.unbound.get(&event.custom_id).cloned()?;
                    if let (EventKind::Component, Some(message_id), Some(Binding::Pending)) =
                        (event.kind(), event.message_id, handler.core().binding())
                    {
                        handler.core().set_binding(Binding::Message(message_id));
                        registry.release(handler.core().id());
                        registry.claim_message(&handler, message_id, &mut displaced);
                        debug!(
                            "Bound {} [{}] to message [{}]",
                            handler.describe(),
                            handler.core().id(),
                            message_id
                        );
                    }
                    Some(handler)
                }
            }
        };

        self.stop_displaced(displaced);
        handler
    }

    fn register(&self, handler: SharedHandler) {
        let custom_ids = handler.custom_ids();
        let mut displaced = Vec::new();

        {
            let mut registry = self.inner.registry.lock();
            match handler.core().binding() {
                Some(Binding::Message(message_id)) => {
                    registry.claim_message(&handler, message_id, &mut displaced)
                }
                Some(Binding::Unbound | Binding::Pending) => {
                    registry.claim_custom_ids(&handler, custom_ids, &mut displaced)
                }
                None => {}
            }
        }

        self.stop_displaced(displaced);
    }

    /// Routes the handler by its current custom ids, called when its items change.
    pub(crate) fn resync(&self, handler: SharedHandler) {
        if !matches!(
            handler.core().binding(),
            Some(Binding::Unbound | Binding::Pending)
        ) {
            return;
        }

        let custom_ids = handler.custom_ids();
        let mut displaced = Vec::new();

        {
            let mut registry = self.inner.registry.lock();
            registry
                .unbound
                .retain(|_, registered| registered.core().id() != handler.core().id());
            registry.claim_custom_ids(&handler, custom_ids, &mut displaced);
        }

        self.stop_displaced(displaced);
    }

    pub(crate) fn unregister(&self, id: HandlerId) {
        self.inner.registry.lock().release(id);
    }

    /// Stops the handlers that lost every route to a newer one.
    fn stop_displaced(&self, displaced: Vec<SharedHandler>) {
        let orphaned = {
            let registry = self.inner.registry.lock();
            displaced
                .into_iter()
                .filter(|handler| !registry.owns_any(handler.core().id()))
                .collect::<Vec<_>>()
        };

        for handler in orphaned {
            warn!(
                "{} [{}] was replaced by a newer handler and will be stopped",
                handler.describe(),
                handler.core().id()
            );
            handler.stop();
        }
    }
}

/// A builder used to set all options before creating the [client](Client).
pub struct ClientBuilder {
    responder: Arc<dyn Responder>,
    transport: Transport,
    log_unhandled: bool,
    response_window: Duration,
}

impl ClientBuilder {
    /// Creates a new [builder](ClientBuilder).
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder,
            transport: Transport::Push,
            log_unhandled: true,
            response_window: Duration::from_secs(3),
        }
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Whether interactions no handler listens to are logged as warnings.
    pub fn log_unhandled(mut self, log_unhandled: bool) -> Self {
        self.log_unhandled = log_unhandled;
        self
    }

    /// How long [process](Client::process) waits for an initial response when pulling.
    pub fn response_window(mut self, response_window: Duration) -> Self {
        self.response_window = response_window;
        self
    }

    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                responder: self.responder,
                transport: self.transport,
                log_unhandled: self.log_unhandled,
                response_window: self.response_window,
                registry: Default::default(),
            }),
        }
    }
}
