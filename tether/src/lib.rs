#![doc = include_str!("../README.md")]

mod handler;

pub mod button;
pub mod client;
pub mod context;
pub mod error;
pub mod event;
pub mod hook;
pub mod item;
pub mod layout;
pub mod menu;
pub mod modal;
pub mod nav;
pub mod responder;
pub mod response;
pub mod select;
pub mod text_input;
pub mod view;

pub(crate) type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// The error type callbacks and hooks are allowed to return.
pub type DefaultError = Box<dyn std::error::Error + Send + Sync>;
/// The output of every item callback.
pub type CallbackResult = Result<(), DefaultError>;

pub use handler::{HandlerId, HandlerState};

/// Useful exports to get started quickly
pub mod prelude {
    pub use crate::{
        button::Button,
        client::{Bind, Client, ProcessResult, Transport},
        context::{Context, ModalContext, ViewContext},
        error::*,
        event::InteractionEvent,
        item::{Item, ViewItem},
        menu::{Menu, MenuContext, Screen, ScreenContent},
        modal::{Modal, ModalValues},
        nav::{NavButton, NavContext, Navigator, Page, Paginator},
        responder::{HttpResponder, Responder},
        response::Response,
        select::{Select, SelectOption},
        text_input::TextInput,
        view::{AutodeferOptions, View, ViewTemplate},
        CallbackResult, DefaultError, HandlerState,
    };
    pub use async_trait::async_trait;
}

pub mod twilight_exports {
    pub use twilight_http::{client::InteractionClient, Client};
    pub use twilight_model::{
        application::interaction::{
            message_component::MessageComponentInteractionData, modal::ModalInteractionData,
            Interaction, InteractionData, InteractionType,
        },
        channel::{
            message::{
                component::{
                    ActionRow, Button as TwilightButton, ButtonStyle, SelectMenu,
                    SelectMenuOption, SelectMenuType, TextInput as TwilightTextInput,
                    TextInputStyle,
                },
                Component, Embed, MessageFlags, ReactionType,
            },
            ChannelType,
        },
        http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
        id::{
            marker::{
                ApplicationMarker, ChannelMarker, GuildMarker, InteractionMarker, MessageMarker,
                UserMarker,
            },
            Id,
        },
    };
}
