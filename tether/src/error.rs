use thiserror::Error;
use twilight_http::{response::DeserializeBodyError, Error as HttpError};
use twilight_validate::component::ComponentValidationError;

/// Errors raised while building a single item.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("custom id is {len} characters long, the maximum is {max}")]
    CustomIdTooLong { len: usize, max: usize },
    #[error("{field} is {len} characters long, the maximum is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("row {0} is out of range, rows go from 0 to 4")]
    InvalidRow(u8),
    #[error("link buttons cannot have a custom id")]
    LinkWithCustomId,
    #[error("link buttons require an url")]
    LinkWithoutUrl,
    #[error("buttons need either a label or an emoji")]
    MissingLabel,
    #[error("text select menus take between 1 and 25 options, got {0}")]
    OptionCount(usize),
    #[error("invalid value range, min is {min} and max is {max}")]
    ValueRange { min: u16, max: u16 },
    #[error("a navigator needs at least one page")]
    NoPages,
    #[error("a line taking {len} characters does not fit in a page of {max}")]
    LineTooLong { len: usize, max: usize },
    #[error(transparent)]
    Validation(#[from] ComponentValidationError),
}

/// Errors raised while placing items in a handler.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("handlers can hold at most 25 items, got {count}")]
    TooManyItems { count: usize },
    #[error("row {row} does not have room for an item of width {width}")]
    RowFull { row: u8, width: u8 },
    #[error("no row has room for an item of width {width}")]
    HandlerFull { width: u8 },
    #[error("row {0} is out of range, rows go from 0 to 4")]
    InvalidRow(u8),
    #[error("an item with custom id {custom_id} is already attached")]
    ItemAlreadyAttached { custom_id: String },
}

/// Errors raised by operations that depend on a handler's lifecycle.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("the handler was already started")]
    AlreadyStarted,
    #[error("the handler was stopped and cannot be started again")]
    AlreadyStopped,
    #[error("the handler was not started")]
    NotStarted,
    #[error("only persistent handlers can be started without a message")]
    NotPersistent,
    #[error("the menu has no screen loaded")]
    EmptyStack,
    #[error("the root screen cannot be popped")]
    CannotPopRoot,
    #[error("cannot pop {requested} screens from a stack of {depth}")]
    InvalidPopCount { requested: usize, depth: usize },
}

/// Errors returned by [`Client::process`](crate::client::Client::process).
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("no response was issued within the response window")]
    NoResponseIssued,
}

/// Errors raised while responding to an interaction.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("the interaction was already responded to")]
    AlreadyResponded,
    #[error("the interaction was not responded to yet")]
    NotResponded,
    #[error("the response channel was closed before the response could be delivered")]
    Closed,
    #[error("a deletion is already scheduled for this response")]
    DeleteAlreadyScheduled,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Deserialize(#[from] DeserializeBodyError),
}

/// Errors raised while building a handler from its parts.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Errors raised by menu navigation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MenuError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Response(#[from] ResponseError),
}
