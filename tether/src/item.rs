//! The item abstraction shared by views and modals.

use crate::{
    button::Button, error::ComponentError, event::InteractionEvent, select::Select,
    twilight_exports::Component,
};

/// The maximum length of a custom id, in characters.
pub const CUSTOM_ID_LENGTH: usize = 100;

/// An interactive element that can be attached to a handler.
///
/// Items are placed on a grid of 5 rows, each one 5 units wide, the [width](Item::width)
/// tells how many units of a row the item takes.
pub trait Item: Clone + Send + Sync + 'static {
    /// The custom id events are routed with, link buttons don't have one.
    fn custom_id(&self) -> Option<&str>;

    /// The row requested for this item, `None` lets the layout pick one.
    fn row(&self) -> Option<u8>;

    /// The amount of row units the item takes.
    fn width(&self) -> u8;

    /// Whether the custom id was supplied by the user and survives restarts.
    fn is_persistent(&self) -> bool;

    fn is_disabled(&self) -> bool {
        false
    }

    /// Renders the item as a twilight component.
    fn build(&self) -> Component;

    /// Updates the item's state from an event targeting it, before its callback runs.
    fn refresh(&mut self, _event: &InteractionEvent) {}
}

/// Any item that can be attached to a [view](crate::view::View).
#[derive(Clone, Debug, PartialEq)]
pub enum ViewItem {
    Button(Button),
    Select(Select),
}

impl ViewItem {
    pub fn as_button(&self) -> Option<&Button> {
        match self {
            Self::Button(button) => Some(button),
            Self::Select(_) => None,
        }
    }

    pub fn as_button_mut(&mut self) -> Option<&mut Button> {
        match self {
            Self::Button(button) => Some(button),
            Self::Select(_) => None,
        }
    }

    pub fn as_select(&self) -> Option<&Select> {
        match self {
            Self::Select(select) => Some(select),
            Self::Button(_) => None,
        }
    }

    pub fn as_select_mut(&mut self) -> Option<&mut Select> {
        match self {
            Self::Select(select) => Some(select),
            Self::Button(_) => None,
        }
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        match self {
            Self::Button(button) => button.set_disabled(disabled),
            Self::Select(select) => select.set_disabled(disabled),
        }
    }
}

impl Item for ViewItem {
    fn custom_id(&self) -> Option<&str> {
        match self {
            Self::Button(button) => button.custom_id(),
            Self::Select(select) => select.custom_id(),
        }
    }

    fn row(&self) -> Option<u8> {
        match self {
            Self::Button(button) => button.row(),
            Self::Select(select) => select.row(),
        }
    }

    fn width(&self) -> u8 {
        match self {
            Self::Button(button) => button.width(),
            Self::Select(select) => select.width(),
        }
    }

    fn is_persistent(&self) -> bool {
        match self {
            Self::Button(button) => button.is_persistent(),
            Self::Select(select) => select.is_persistent(),
        }
    }

    fn is_disabled(&self) -> bool {
        match self {
            Self::Button(button) => button.is_disabled(),
            Self::Select(select) => select.is_disabled(),
        }
    }

    fn build(&self) -> Component {
        match self {
            Self::Button(button) => button.build(),
            Self::Select(select) => select.build(),
        }
    }

    fn refresh(&mut self, event: &InteractionEvent) {
        match self {
            Self::Button(button) => button.refresh(event),
            Self::Select(select) => select.refresh(event),
        }
    }
}

impl From<Button> for ViewItem {
    fn from(button: Button) -> Self {
        Self::Button(button)
    }
}

impl From<Select> for ViewItem {
    fn from(select: Select) -> Self {
        Self::Select(select)
    }
}

/// Generates a random, non persistent, custom id made of 32 hex characters.
pub(crate) fn random_custom_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Validates the given custom id or generates a random one, returning whether the
/// resulting id is persistent.
pub(crate) fn resolve_custom_id(
    custom_id: Option<String>,
) -> Result<(String, bool), ComponentError> {
    match custom_id {
        Some(custom_id) => {
            validate_length_of(&custom_id, CUSTOM_ID_LENGTH)
                .map_err(|len| ComponentError::CustomIdTooLong {
                    len,
                    max: CUSTOM_ID_LENGTH,
                })?;
            Ok((custom_id, true))
        }
        None => Ok((random_custom_id(), false)),
    }
}

pub(crate) fn validate_row(row: Option<u8>) -> Result<(), ComponentError> {
    match row {
        Some(row) if row as usize >= crate::layout::ROW_COUNT => Err(ComponentError::InvalidRow(row)),
        _ => Ok(()),
    }
}

pub(crate) fn validate_length(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ComponentError> {
    match value {
        Some(value) => validate_length_of(value, max)
            .map_err(|len| ComponentError::TooLong { field, len, max }),
        None => Ok(()),
    }
}

fn validate_length_of(value: &str, max: usize) -> Result<(), usize> {
    let len = value.chars().count();
    if len > max {
        Err(len)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_hex() {
        let id = random_custom_id();

        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, random_custom_id());
    }

    #[test]
    fn supplied_ids_are_persistent() {
        let (id, persistent) = resolve_custom_id(Some("confirm".to_owned())).unwrap();
        assert_eq!(id, "confirm");
        assert!(persistent);

        let (_, persistent) = resolve_custom_id(None).unwrap();
        assert!(!persistent);
    }

    #[test]
    fn custom_id_length_is_counted_in_characters() {
        assert!(resolve_custom_id(Some("é".repeat(100))).is_ok());
        assert!(matches!(
            resolve_custom_id(Some("a".repeat(101))),
            Err(ComponentError::CustomIdTooLong { len: 101, max: 100 })
        ));
    }

    #[test]
    fn rows_above_four_are_rejected() {
        assert!(validate_row(Some(4)).is_ok());
        assert!(matches!(validate_row(Some(5)), Err(ComponentError::InvalidRow(5))));
    }
}
