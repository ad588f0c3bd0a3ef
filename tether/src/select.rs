//! Select menus of every kind supported by Discord.

use crate::{
    error::ComponentError,
    event::InteractionEvent,
    item::{resolve_custom_id, validate_length, validate_row, Item},
    twilight_exports::{
        ActionRow, ChannelType, Component, Id, ReactionType, SelectMenu, SelectMenuOption,
        SelectMenuType,
    },
};
use std::str::FromStr;

pub const SELECT_PLACEHOLDER_LENGTH: usize = 150;
pub const SELECT_OPTION_COUNT: usize = 25;
pub const SELECT_OPTION_TEXT_LENGTH: usize = 100;

/// A choice of a text select menu.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectOption {
    label: String,
    value: String,
    description: Option<String>,
    emoji: Option<ReactionType>,
    default: bool,
}

impl SelectOption {
    /// Creates an option whose value is the same as its label.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            value: label.clone(),
            label,
            description: None,
            emoji: None,
            default: false,
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn emoji(mut self, emoji: ReactionType) -> Self {
        self.emoji = Some(emoji);
        self
    }

    /// Marks the option as selected by default.
    pub fn default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    pub fn label_text(&self) -> &str {
        &self.label
    }

    pub fn value_text(&self) -> &str {
        &self.value
    }

    fn validate(&self) -> Result<(), ComponentError> {
        validate_length("option label", Some(&self.label), SELECT_OPTION_TEXT_LENGTH)?;
        validate_length("option value", Some(&self.value), SELECT_OPTION_TEXT_LENGTH)?;
        validate_length(
            "option description",
            self.description.as_deref(),
            SELECT_OPTION_TEXT_LENGTH,
        )
    }

    fn build(&self) -> SelectMenuOption {
        SelectMenuOption {
            default: self.default,
            description: self.description.clone(),
            emoji: self.emoji.clone(),
            label: self.label.clone(),
            value: self.value.clone(),
        }
    }
}

/// What a select menu lets the user choose from.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectKind {
    Text(Vec<SelectOption>),
    User,
    Role,
    Mentionable,
    /// Channels, optionally restricted to the given channel types.
    Channel(Vec<ChannelType>),
}

/// A select menu, taking a whole row.
#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    kind: SelectKind,
    custom_id: String,
    persistent: bool,
    placeholder: Option<String>,
    min_values: u8,
    max_values: u8,
    disabled: bool,
    row: Option<u8>,
    values: Vec<String>,
}

impl Select {
    pub fn text(options: Vec<SelectOption>) -> SelectBuilder {
        SelectBuilder::new(SelectKind::Text(options))
    }

    pub fn user() -> SelectBuilder {
        SelectBuilder::new(SelectKind::User)
    }

    pub fn role() -> SelectBuilder {
        SelectBuilder::new(SelectKind::Role)
    }

    pub fn mentionable() -> SelectBuilder {
        SelectBuilder::new(SelectKind::Mentionable)
    }

    pub fn channel(channel_types: Vec<ChannelType>) -> SelectBuilder {
        SelectBuilder::new(SelectKind::Channel(channel_types))
    }

    pub fn kind(&self) -> &SelectKind {
        &self.kind
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    /// The values chosen in the last interaction with this select.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Parses the chosen values as ids, skipping the ones that are not valid ids.
    ///
    /// Useful for user, role, mentionable and channel selects.
    pub fn selected_ids<T>(&self) -> Vec<Id<T>> {
        self.values
            .iter()
            .filter_map(|value| Id::<T>::from_str(value).ok())
            .collect()
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn set_placeholder(&mut self, placeholder: Option<String>) -> Result<(), ComponentError> {
        validate_length("placeholder", placeholder.as_deref(), SELECT_PLACEHOLDER_LENGTH)?;
        self.placeholder = placeholder;
        Ok(())
    }
}

impl Item for Select {
    fn custom_id(&self) -> Option<&str> {
        Some(&self.custom_id)
    }

    fn row(&self) -> Option<u8> {
        self.row
    }

    fn width(&self) -> u8 {
        5
    }

    fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn build(&self) -> Component {
        let (kind, options, channel_types) = match &self.kind {
            SelectKind::Text(options) => (
                SelectMenuType::Text,
                Some(options.iter().map(SelectOption::build).collect()),
                None,
            ),
            SelectKind::User => (SelectMenuType::User, None, None),
            SelectKind::Role => (SelectMenuType::Role, None, None),
            SelectKind::Mentionable => (SelectMenuType::Mentionable, None, None),
            SelectKind::Channel(types) => (
                SelectMenuType::Channel,
                None,
                (!types.is_empty()).then(|| types.clone()),
            ),
        };

        Component::SelectMenu(SelectMenu {
            channel_types,
            custom_id: self.custom_id.clone(),
            default_values: None,
            disabled: self.disabled,
            kind,
            max_values: Some(self.max_values),
            min_values: Some(self.min_values),
            options,
            placeholder: self.placeholder.clone(),
        })
    }

    fn refresh(&mut self, event: &InteractionEvent) {
        self.values = event.values().to_vec();
    }
}

/// A builder used to create [select menus](Select).
pub struct SelectBuilder {
    kind: SelectKind,
    custom_id: Option<String>,
    placeholder: Option<String>,
    min_values: u8,
    max_values: u8,
    disabled: bool,
    row: Option<u8>,
}

impl SelectBuilder {
    fn new(kind: SelectKind) -> Self {
        Self {
            kind,
            custom_id: None,
            placeholder: None,
            min_values: 1,
            max_values: 1,
            disabled: false,
            row: None,
        }
    }

    /// Sets the custom id of the select, making it persistent.
    pub fn custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = Some(custom_id.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn min_values(mut self, min_values: u8) -> Self {
        self.min_values = min_values;
        self
    }

    pub fn max_values(mut self, max_values: u8) -> Self {
        self.max_values = max_values;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn row(mut self, row: u8) -> Self {
        self.row = Some(row);
        self
    }

    pub fn build(self) -> Result<Select, ComponentError> {
        validate_row(self.row)?;
        validate_length("placeholder", self.placeholder.as_deref(), SELECT_PLACEHOLDER_LENGTH)?;

        if self.min_values > self.max_values || self.max_values as usize > SELECT_OPTION_COUNT {
            return Err(ComponentError::ValueRange {
                min: self.min_values as u16,
                max: self.max_values as u16,
            });
        }

        if let SelectKind::Text(options) = &self.kind {
            if options.is_empty() || options.len() > SELECT_OPTION_COUNT {
                return Err(ComponentError::OptionCount(options.len()));
            }
            for option in options {
                option.validate()?;
            }
            if self.max_values as usize > options.len() {
                return Err(ComponentError::ValueRange {
                    min: self.min_values as u16,
                    max: self.max_values as u16,
                });
            }
        }

        let (custom_id, persistent) = resolve_custom_id(self.custom_id)?;
        let select = Select {
            kind: self.kind,
            custom_id,
            persistent,
            placeholder: self.placeholder,
            min_values: self.min_values,
            max_values: self.max_values,
            disabled: self.disabled,
            row: self.row,
            values: Vec::new(),
        };

        twilight_validate::component::component(&Component::ActionRow(ActionRow {
            components: vec![select.build()],
        }))?;

        Ok(select)
    }
}
