//! Response bookkeeping of a single interaction.

use crate::{error::ResponseError, responder::Responder, twilight_exports::*};
use parking_lot::Mutex;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::oneshot::{channel, Receiver, Sender},
    task::JoinHandle,
};
use tracing::warn;

/// Tracks whether the initial response of an interaction was issued and, when the
/// client pulls responses, where it must be delivered.
pub(crate) struct ResponseState {
    issued: AtomicBool,
    pull: Option<Mutex<Option<Sender<InteractionResponse>>>>,
}

impl ResponseState {
    /// A state whose initial response is sent over http.
    pub(crate) fn push() -> Arc<Self> {
        Arc::new(Self {
            issued: AtomicBool::new(false),
            pull: None,
        })
    }

    /// A state whose initial response is handed back to the caller through the receiver.
    pub(crate) fn pull() -> (Arc<Self>, Receiver<InteractionResponse>) {
        let (sender, receiver) = channel();
        let state = Arc::new(Self {
            issued: AtomicBool::new(false),
            pull: Some(Mutex::new(Some(sender))),
        });

        (state, receiver)
    }

    pub(crate) fn is_issued(&self) -> bool {
        self.issued.load(Ordering::Acquire)
    }

    /// Claims the initial response, returning false if it was already claimed.
    pub(crate) fn claim(&self) -> bool {
        !self.issued.swap(true, Ordering::AcqRel)
    }

    /// Delivers the initial response, the caller must have [claimed](Self::claim) it first.
    pub(crate) async fn deliver(
        &self,
        responder: &dyn Responder,
        interaction_id: Id<InteractionMarker>,
        token: &str,
        response: InteractionResponse,
    ) -> Result<(), ResponseError> {
        match &self.pull {
            Some(sender) => {
                let sender = sender.lock().take().ok_or(ResponseError::Closed)?;
                sender.send(response).map_err(|_| ResponseError::Closed)
            }
            None => {
                responder
                    .create_response(interaction_id, token, &response)
                    .await
            }
        }
    }

    /// Drops the pull channel so the waiting caller doesn't wait for a response that
    /// will never come.
    pub(crate) fn release(&self) {
        if let Some(sender) = &self.pull {
            sender.lock().take();
        }
    }
}

/// A message sent in response to an interaction, either the initial response or a followup.
#[derive(Clone)]
pub struct Response {
    responder: Arc<dyn Responder>,
    token: Arc<str>,
    message_id: Option<Id<MessageMarker>>,
    delete_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Response {
    pub(crate) fn new(
        responder: Arc<dyn Responder>,
        token: Arc<str>,
        message_id: Option<Id<MessageMarker>>,
    ) -> Self {
        Self {
            responder,
            token,
            message_id,
            delete_task: Default::default(),
        }
    }

    /// The id of the followup message, `None` for the initial response.
    pub fn message_id(&self) -> Option<Id<MessageMarker>> {
        self.message_id
    }

    pub fn is_followup(&self) -> bool {
        self.message_id.is_some()
    }

    /// Edits the message.
    pub async fn edit(&self, data: &InteractionResponseData) -> Result<(), ResponseError> {
        match self.message_id {
            Some(message_id) => {
                self.responder
                    .update_followup(&self.token, message_id, data)
                    .await
            }
            None => self.responder.update_response(&self.token, data).await,
        }
    }

    /// Deletes the message.
    pub async fn delete(&self) -> Result<(), ResponseError> {
        match self.message_id {
            Some(message_id) => self.responder.delete_followup(&self.token, message_id).await,
            None => self.responder.delete_response(&self.token).await,
        }
    }

    /// Deletes the message once the given delay elapses.
    ///
    /// Only one deletion can be scheduled per message.
    pub fn delete_after(&self, delay: Duration) -> Result<(), ResponseError> {
        let mut task = self.delete_task.lock();
        if task.is_some() {
            return Err(ResponseError::DeleteAlreadyScheduled);
        }

        let response = self.clone();
        *task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(error) = response.delete().await {
                warn!("Failed to delete response after {:?}: {}", delay, error);
            }
        }));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::testing::{Call, RecordingResponder};

    #[tokio::test]
    async fn initial_response_is_claimed_once() {
        let state = ResponseState::push();

        assert!(!state.is_issued());
        assert!(state.claim());
        assert!(state.is_issued());
        assert!(!state.claim());
    }

    #[tokio::test]
    async fn pull_state_delivers_through_the_channel() {
        let responder = RecordingResponder::default();
        let (state, receiver) = ResponseState::pull();
        let response = InteractionResponse {
            kind: InteractionResponseType::DeferredUpdateMessage,
            data: None,
        };

        state.claim();
        state
            .deliver(&responder, Id::new(1), "token", response.clone())
            .await
            .unwrap();

        assert_eq!(receiver.await.unwrap(), response);
        assert!(responder.calls().is_empty());
        assert!(matches!(
            state.deliver(&responder, Id::new(1), "token", response).await,
            Err(ResponseError::Closed)
        ));
    }

    #[tokio::test]
    async fn released_pull_state_closes_the_receiver() {
        let (state, receiver) = ResponseState::pull();

        state.release();

        assert!(receiver.await.is_err());
    }

    #[tokio::test]
    async fn followups_are_edited_and_deleted_by_id() {
        let responder = RecordingResponder::default();
        let response = Response::new(Arc::new(responder.clone()), "token".into(), Some(Id::new(5)));
        let data = InteractionResponseData {
            content: Some("edited".to_owned()),
            ..Default::default()
        };

        response.edit(&data).await.unwrap();
        response.delete().await.unwrap();

        assert_eq!(
            responder.calls(),
            vec![
                Call::UpdateFollowup(Id::new(5), data),
                Call::DeleteFollowup(Id::new(5))
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn delete_after_runs_once() {
        let responder = RecordingResponder::default();
        let response = Response::new(Arc::new(responder.clone()), "token".into(), None);

        response.delete_after(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            response.delete_after(Duration::from_secs(1)),
            Err(ResponseError::DeleteAlreadyScheduled)
        ));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(responder.calls().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(responder.calls(), vec![Call::DeleteResponse]);
    }
}
