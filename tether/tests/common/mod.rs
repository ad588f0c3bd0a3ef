#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tether::{
    error::ResponseError,
    prelude::*,
    twilight_exports::{
        Id, InteractionMarker, InteractionResponse, InteractionResponseData, MessageMarker,
    },
};

/// What the mock responder was asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Sent {
    Response(String, InteractionResponse),
    Edit(String, InteractionResponseData),
    Followup(String, InteractionResponseData),
    Deleted(String),
}

#[derive(Clone, Default)]
pub struct MockResponder {
    sent: Arc<Mutex<Vec<Sent>>>,
}

impl MockResponder {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    /// Waits until at least `count` calls were made, giving spawned callbacks the chance to run.
    pub async fn wait_for(&self, count: usize) -> Vec<Sent> {
        for _ in 0..100 {
            if self.sent.lock().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn create_response(
        &self,
        _: Id<InteractionMarker>,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ResponseError> {
        self.sent
            .lock()
            .push(Sent::Response(token.to_owned(), response.clone()));
        Ok(())
    }

    async fn update_response(
        &self,
        token: &str,
        data: &InteractionResponseData,
    ) -> Result<(), ResponseError> {
        self.sent
            .lock()
            .push(Sent::Edit(token.to_owned(), data.clone()));
        Ok(())
    }

    async fn delete_response(&self, token: &str) -> Result<(), ResponseError> {
        self.sent.lock().push(Sent::Deleted(token.to_owned()));
        Ok(())
    }

    async fn create_followup(
        &self,
        token: &str,
        data: &InteractionResponseData,
    ) -> Result<Id<MessageMarker>, ResponseError> {
        let mut sent = self.sent.lock();
        sent.push(Sent::Followup(token.to_owned(), data.clone()));
        Ok(Id::new(5000 + sent.len() as u64))
    }

    async fn update_followup(
        &self,
        token: &str,
        _: Id<MessageMarker>,
        data: &InteractionResponseData,
    ) -> Result<(), ResponseError> {
        self.sent
            .lock()
            .push(Sent::Edit(token.to_owned(), data.clone()));
        Ok(())
    }

    async fn delete_followup(&self, token: &str, _: Id<MessageMarker>) -> Result<(), ResponseError> {
        self.sent.lock().push(Sent::Deleted(token.to_owned()));
        Ok(())
    }
}

pub fn client(responder: &MockResponder) -> Client {
    Client::builder(responder.clone()).build()
}

pub fn button(custom_id: &str) -> Button {
    Button::builder()
        .label(custom_id)
        .custom_id(custom_id)
        .build()
        .unwrap()
}

/// A click on the given component of the given message.
pub fn click(interaction: u64, custom_id: &str, message: u64) -> InteractionEvent {
    InteractionEvent::component(
        Id::new(interaction),
        Id::new(1),
        format!("token-{interaction}"),
        custom_id,
    )
    .with_message(Id::new(message))
}

pub fn text(content: &str) -> InteractionResponseData {
    InteractionResponseData {
        content: Some(content.to_owned()),
        ..Default::default()
    }
}
