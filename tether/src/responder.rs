//! The seam between handlers and Discord's interaction endpoints.

use crate::{error::ResponseError, twilight_exports::*};
use async_trait::async_trait;
use std::{ops::Deref, sync::Arc};

/// A wrapper around twilight's http client allowing the user to decide how to provide it.
#[allow(clippy::large_enum_variant)]
pub enum WrappedClient {
    Arc(Arc<Client>),
    Raw(Client),
    Boxed(Box<dyn Deref<Target = Client> + Send + Sync>),
}

impl WrappedClient {
    /// Returns the underlying http client.
    pub fn inner(&self) -> &Client {
        match self {
            Self::Arc(c) => c,
            Self::Raw(c) => c,
            Self::Boxed(b) => b,
        }
    }
}

impl From<Client> for WrappedClient {
    fn from(c: Client) -> Self {
        WrappedClient::Raw(c)
    }
}

impl From<Arc<Client>> for WrappedClient {
    fn from(c: Arc<Client>) -> Self {
        WrappedClient::Arc(c)
    }
}

impl From<Box<dyn Deref<Target = Client> + Send + Sync>> for WrappedClient {
    fn from(c: Box<dyn Deref<Target = Client> + Send + Sync>) -> Self {
        Self::Boxed(c)
    }
}

/// Everything handlers need to answer interactions.
///
/// [HttpResponder] talks to Discord, other implementations can be used to bridge custom
/// transports or to record responses.
#[async_trait]
pub trait Responder: Send + Sync + 'static {
    /// Sends the initial response of an interaction.
    async fn create_response(
        &self,
        interaction_id: Id<InteractionMarker>,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ResponseError>;

    /// Edits the initial response of an interaction.
    async fn update_response(
        &self,
        token: &str,
        data: &InteractionResponseData,
    ) -> Result<(), ResponseError>;

    async fn delete_response(&self, token: &str) -> Result<(), ResponseError>;

    /// Sends a followup message, returning its id.
    async fn create_followup(
        &self,
        token: &str,
        data: &InteractionResponseData,
    ) -> Result<Id<MessageMarker>, ResponseError>;

    async fn update_followup(
        &self,
        token: &str,
        message_id: Id<MessageMarker>,
        data: &InteractionResponseData,
    ) -> Result<(), ResponseError>;

    async fn delete_followup(
        &self,
        token: &str,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ResponseError>;
}

/// A [responder](Responder) using twilight's http client.
pub struct HttpResponder {
    http_client: WrappedClient,
    application_id: Id<ApplicationMarker>,
}

impl HttpResponder {
    pub fn new(http_client: impl Into<WrappedClient>, application_id: Id<ApplicationMarker>) -> Self {
        Self {
            http_client: http_client.into(),
            application_id,
        }
    }

    /// Gets the http client used by the responder.
    pub fn http_client(&self) -> &Client {
        self.http_client.inner()
    }

    pub fn application_id(&self) -> Id<ApplicationMarker> {
        self.application_id
    }

    fn interaction(&self) -> InteractionClient<'_> {
        self.http_client.inner().interaction(self.application_id)
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn create_response(
        &self,
        interaction_id: Id<InteractionMarker>,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ResponseError> {
        self.interaction()
            .create_response(interaction_id, token, response)
            .await?;
        Ok(())
    }

    async fn update_response(
        &self,
        token: &str,
        data: &InteractionResponseData,
    ) -> Result<(), ResponseError> {
        let client = self.interaction();
        let mut request = client.update_response(token);

        if let Some(content) = &data.content {
            request = request.content(Some(content.as_str()));
        }
        if let Some(components) = &data.components {
            request = request.components(Some(components.as_slice()));
        }
        if let Some(embeds) = &data.embeds {
            request = request.embeds(Some(embeds.as_slice()));
        }

        request.await?;
        Ok(())
    }

    async fn delete_response(&self, token: &str) -> Result<(), ResponseError> {
        self.interaction().delete_response(token).await?;
        Ok(())
    }

    async fn create_followup(
        &self,
        token: &str,
        data: &InteractionResponseData,
    ) -> Result<Id<MessageMarker>, ResponseError> {
        let client = self.interaction();
        let mut request = client.create_followup(token);

        if let Some(content) = &data.content {
            request = request.content(content.as_str());
        }
        if let Some(components) = &data.components {
            request = request.components(components.as_slice());
        }
        if let Some(embeds) = &data.embeds {
            request = request.embeds(embeds.as_slice());
        }
        if let Some(flags) = data.flags {
            request = request.flags(flags);
        }

        let message = request.await?.model().await?;
        Ok(message.id)
    }

    async fn update_followup(
        &self,
        token: &str,
        message_id: Id<MessageMarker>,
        data: &InteractionResponseData,
    ) -> Result<(), ResponseError> {
        let client = self.interaction();
        let mut request = client.update_followup(token, message_id);

        if let Some(content) = &data.content {
            request = request.content(Some(content.as_str()));
        }
        if let Some(components) = &data.components {
            request = request.components(Some(components.as_slice()));
        }
        if let Some(embeds) = &data.embeds {
            request = request.embeds(Some(embeds.as_slice()));
        }

        request.await?;
        Ok(())
    }

    async fn delete_followup(
        &self,
        token: &str,
        message_id: Id<MessageMarker>,
    ) -> Result<(), ResponseError> {
        self.interaction()
            .delete_followup(token, message_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// A call received by the [recording responder](RecordingResponder).
    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        Create(InteractionResponse),
        Update(InteractionResponseData),
        DeleteResponse,
        Followup(InteractionResponseData),
        UpdateFollowup(Id<MessageMarker>, InteractionResponseData),
        DeleteFollowup(Id<MessageMarker>),
    }

    #[derive(Clone, Default)]
    pub struct RecordingResponder {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingResponder {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().push(call);
        }
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn create_response(
            &self,
            _: Id<InteractionMarker>,
            _: &str,
            response: &InteractionResponse,
        ) -> Result<(), ResponseError> {
            self.record(Call::Create(response.clone()));
            Ok(())
        }

        async fn update_response(
            &self,
            _: &str,
            data: &InteractionResponseData,
        ) -> Result<(), ResponseError> {
            self.record(Call::Update(data.clone()));
            Ok(())
        }

        async fn delete_response(&self, _: &str) -> Result<(), ResponseError> {
            self.record(Call::DeleteResponse);
            Ok(())
        }

        async fn create_followup(
            &self,
            _: &str,
            data: &InteractionResponseData,
        ) -> Result<Id<MessageMarker>, ResponseError> {
            let mut calls = self.calls.lock();
            calls.push(Call::Followup(data.clone()));
            Ok(Id::new(1000 + calls.len() as u64))
        }

        async fn update_followup(
            &self,
            _: &str,
            message_id: Id<MessageMarker>,
            data: &InteractionResponseData,
        ) -> Result<(), ResponseError> {
            self.record(Call::UpdateFollowup(message_id, data.clone()));
            Ok(())
        }

        async fn delete_followup(
            &self,
            _: &str,
            message_id: Id<MessageMarker>,
        ) -> Result<(), ResponseError> {
            self.record(Call::DeleteFollowup(message_id));
            Ok(())
        }
    }
}
