//! The interaction events dispatched to handlers.

use crate::twilight_exports::*;

/// The kind of interaction an [event](InteractionEvent) was created from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A button press or a select menu submission.
    Component,
    /// A modal submission.
    ModalSubmit,
}

/// A text input value sent along a modal submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedField {
    pub custom_id: String,
    pub value: Option<String>,
}

/// The kind specific data of an [event](InteractionEvent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventPayload {
    /// Values chosen in a select menu, empty for buttons.
    Component { values: Vec<String> },
    /// Every text input sent with a modal submission.
    Modal { fields: Vec<SubmittedField> },
}

/// An inbound component or modal interaction, reduced to what handlers need.
#[derive(Clone, Debug)]
pub struct InteractionEvent {
    pub id: Id<InteractionMarker>,
    pub application_id: Id<ApplicationMarker>,
    pub token: String,
    /// The custom id of the item or modal the interaction targets.
    pub custom_id: String,
    /// The message the component is attached to, missing for modal submissions
    /// not originating from a component.
    pub message_id: Option<Id<MessageMarker>>,
    pub guild_id: Option<Id<GuildMarker>>,
    pub channel_id: Option<Id<ChannelMarker>>,
    pub user_id: Option<Id<UserMarker>>,
    pub locale: Option<String>,
    pub payload: EventPayload,
}

impl InteractionEvent {
    /// Creates a component event without any selected values.
    pub fn component(
        id: Id<InteractionMarker>,
        application_id: Id<ApplicationMarker>,
        token: impl Into<String>,
        custom_id: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            application_id,
            token.into(),
            custom_id.into(),
            EventPayload::Component { values: Vec::new() },
        )
    }

    /// Creates a modal submission event.
    pub fn modal_submit(
        id: Id<InteractionMarker>,
        application_id: Id<ApplicationMarker>,
        token: impl Into<String>,
        custom_id: impl Into<String>,
        fields: Vec<SubmittedField>,
    ) -> Self {
        Self::new(
            id,
            application_id,
            token.into(),
            custom_id.into(),
            EventPayload::Modal { fields },
        )
    }

    fn new(
        id: Id<InteractionMarker>,
        application_id: Id<ApplicationMarker>,
        token: String,
        custom_id: String,
        payload: EventPayload,
    ) -> Self {
        Self {
            id,
            application_id,
            token,
            custom_id,
            message_id: None,
            guild_id: None,
            channel_id: None,
            user_id: None,
            locale: None,
            payload,
        }
    }

    /// Sets the message the event originates from.
    pub fn with_message(mut self, message_id: Id<MessageMarker>) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Sets the user that triggered the event.
    pub fn with_user(mut self, user_id: Id<UserMarker>) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the values chosen in a select menu, does nothing on modal submissions.
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let EventPayload::Component { values: current } = &mut self.payload {
            *current = values.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Converts a gateway or webhook interaction into an event, returning `None` for
    /// interactions that are neither component interactions nor modal submissions.
    pub fn from_interaction(interaction: &Interaction) -> Option<Self> {
        let (custom_id, payload) = match interaction.data.as_ref()? {
            InteractionData::MessageComponent(data) => (
                data.custom_id.clone(),
                EventPayload::Component {
                    values: data.values.clone(),
                },
            ),
            InteractionData::ModalSubmit(data) => (
                data.custom_id.clone(),
                EventPayload::Modal {
                    fields: data
                        .components
                        .iter()
                        .flat_map(|row| row.components.iter())
                        .map(|field| SubmittedField {
                            custom_id: field.custom_id.clone(),
                            value: field.value.clone().into(),
                        })
                        .collect(),
                },
            ),
            _ => return None,
        };

        Some(Self {
            id: interaction.id,
            application_id: interaction.application_id,
            token: interaction.token.clone(),
            custom_id,
            message_id: interaction.message.as_ref().map(|message| message.id),
            guild_id: interaction.guild_id,
            #[allow(deprecated)]
            channel_id: interaction.channel_id,
            user_id: interaction.author_id(),
            locale: interaction.locale.clone(),
            payload,
        })
    }

    /// The kind of interaction this event was created from.
    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::Component { .. } => EventKind::Component,
            EventPayload::Modal { .. } => EventKind::ModalSubmit,
        }
    }

    /// Values chosen in a select menu, empty for buttons and modal submissions.
    pub fn values(&self) -> &[String] {
        match &self.payload {
            EventPayload::Component { values } => values,
            EventPayload::Modal { .. } => &[],
        }
    }

    /// The submitted value of the text input with the given custom id.
    pub fn field(&self, custom_id: &str) -> Option<&str> {
        match &self.payload {
            EventPayload::Modal { fields } => fields
                .iter()
                .find(|field| field.custom_id == custom_id)
                .and_then(|field| field.value.as_deref()),
            EventPayload::Component { .. } => None,
        }
    }
}
