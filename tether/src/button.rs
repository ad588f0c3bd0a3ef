use crate::{
    error::ComponentError,
    item::{resolve_custom_id, validate_length, validate_row, Item},
    twilight_exports::{ActionRow, ButtonStyle, Component, ReactionType, TwilightButton},
};

/// The maximum length of a button label.
pub const BUTTON_LABEL_LENGTH: usize = 80;

/// A clickable button, taking a single unit of a row.
#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    style: ButtonStyle,
    label: Option<String>,
    emoji: Option<ReactionType>,
    url: Option<String>,
    custom_id: Option<String>,
    persistent: bool,
    disabled: bool,
    row: Option<u8>,
}

impl Button {
    /// Creates a new [button builder](ButtonBuilder).
    pub fn builder() -> ButtonBuilder {
        ButtonBuilder::default()
    }

    /// Creates a builder for a link button pointing to the given url.
    pub fn link(url: impl Into<String>) -> ButtonBuilder {
        ButtonBuilder {
            style: ButtonStyle::Link,
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn style(&self) -> ButtonStyle {
        self.style
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn emoji(&self) -> Option<&ReactionType> {
        self.emoji.as_ref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Changes the style of the button, link buttons keep their style.
    pub fn set_style(&mut self, style: ButtonStyle) {
        if self.url.is_none() && style != ButtonStyle::Link {
            self.style = style;
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> Result<(), ComponentError> {
        let label = label.into();
        validate_length("label", Some(&label), BUTTON_LABEL_LENGTH)?;
        self.label = Some(label);
        Ok(())
    }

    pub fn set_emoji(&mut self, emoji: Option<ReactionType>) {
        self.emoji = emoji;
    }
}

impl Item for Button {
    fn custom_id(&self) -> Option<&str> {
        self.custom_id.as_deref()
    }

    fn row(&self) -> Option<u8> {
        self.row
    }

    fn width(&self) -> u8 {
        1
    }

    fn is_persistent(&self) -> bool {
        // Link buttons never receive events.
        self.persistent || self.url.is_some()
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn build(&self) -> Component {
        Component::Button(TwilightButton {
            custom_id: self.custom_id.clone(),
            disabled: self.disabled,
            emoji: self.emoji.clone(),
            label: self.label.clone(),
            style: self.style,
            url: self.url.clone(),
        })
    }
}

/// A builder used to create [buttons](Button).
pub struct ButtonBuilder {
    style: ButtonStyle,
    label: Option<String>,
    emoji: Option<ReactionType>,
    url: Option<String>,
    custom_id: Option<String>,
    disabled: bool,
    row: Option<u8>,
}

impl Default for ButtonBuilder {
    fn default() -> Self {
        Self {
            style: ButtonStyle::Primary,
            label: None,
            emoji: None,
            url: None,
            custom_id: None,
            disabled: false,
            row: None,
        }
    }
}

impl ButtonBuilder {
    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn emoji(mut self, emoji: ReactionType) -> Self {
        self.emoji = Some(emoji);
        self
    }

    /// Sets the custom id of the button, making it persistent.
    pub fn custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = Some(custom_id.into());
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

    /// Validates the button, generating a random custom id if none was given.
    pub fn build(self) -> Result<Button, ComponentError> {
        validate_row(self.row)?;
        validate_length("label", self.label.as_deref(), BUTTON_LABEL_LENGTH)?;

        if self.label.is_none() && self.emoji.is_none() {
            return Err(ComponentError::MissingLabel);
        }

        let (custom_id, persistent) = match (&self.url, self.style) {
            (Some(_), _) if self.custom_id.is_some() => return Err(ComponentError::LinkWithCustomId),
            (Some(_), _) => (None, false),
            (None, ButtonStyle::Link) => return Err(ComponentError::LinkWithoutUrl),
            (None, _) => {
                let (custom_id, persistent) = resolve_custom_id(self.custom_id)?;
                (Some(custom_id), persistent)
            }
        };

        let button = Button {
            style: if self.url.is_some() {
                ButtonStyle::Link
            } else {
                self.style
            },
            label: self.label,
            emoji: self.emoji,
            url: self.url,
            custom_id,
            persistent,
            disabled: self.disabled,
            row: self.row,
        };

        twilight_validate::component::component(&Component::ActionRow(ActionRow {
            components: vec![button.build()],
        }))?;

        Ok(button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_without_custom_id_are_not_persistent() {
        let button = Button::builder().label("Click").build().unwrap();

        assert!(!button.is_persistent());
        assert_eq!(button.custom_id().map(str::len), Some(32));
        assert_eq!(button.width(), 1);
    }

    #[test]
    fn buttons_with_custom_id_are_persistent() {
        let button = Button::builder()
            .label("Click")
            .custom_id("click")
            .style(ButtonStyle::Danger)
            .build()
            .unwrap();

        assert!(button.is_persistent());
        assert_eq!(button.custom_id(), Some("click"));
        assert_eq!(button.style(), ButtonStyle::Danger);
    }

    #[test]
    fn link_buttons_have_no_custom_id() {
        let button = Button::link("https://docs.rs").label("Docs").build().unwrap();

        assert_eq!(button.custom_id(), None);
        assert_eq!(button.style(), ButtonStyle::Link);
        assert!(button.is_persistent());

        assert!(matches!(
            Button::link("https://docs.rs").label("Docs").custom_id("docs").build(),
            Err(ComponentError::LinkWithCustomId)
        ));
        assert!(matches!(
            Button::builder().label("Docs").style(ButtonStyle::Link).build(),
            Err(ComponentError::LinkWithoutUrl)
        ));
    }

    #[test]
    fn invalid_buttons_are_rejected() {
        assert!(matches!(
            Button::builder().build(),
            Err(ComponentError::MissingLabel)
        ));
        assert!(matches!(
            Button::builder().label("a".repeat(81)).build(),
            Err(ComponentError::TooLong { field: "label", len: 81, max: 80 })
        ));
        assert!(matches!(
            Button::builder().label("x").custom_id("a".repeat(101)).build(),
            Err(ComponentError::CustomIdTooLong { .. })
        ));
        assert!(matches!(
            Button::builder().label("x").row(5).build(),
            Err(ComponentError::InvalidRow(5))
        ));
    }

    #[test]
    fn built_component_mirrors_the_button() {
        let mut button = Button::builder()
            .label("Stop")
            .custom_id("stop")
            .build()
            .unwrap();
        button.set_disabled(true);

        match button.build() {
            Component::Button(built) => {
                assert_eq!(built.custom_id.as_deref(), Some("stop"));
                assert_eq!(built.label.as_deref(), Some("Stop"));
                assert!(built.disabled);
            }
            other => panic!("expected a button, got {other:?}"),
        }
    }
}
