use crate::{
    error::ComponentError,
    event::{EventPayload, InteractionEvent},
    item::{resolve_custom_id, validate_length, validate_row, Item},
    twilight_exports::{ActionRow, Component, TextInputStyle, TwilightTextInput},
};

pub const TEXT_INPUT_LABEL_LENGTH: usize = 45;
pub const TEXT_INPUT_PLACEHOLDER_LENGTH: usize = 100;
pub const TEXT_INPUT_VALUE_LENGTH: u16 = 4000;

/// A text field that can be attached to [modals](crate::modal::Modal).
///
/// Short inputs take a single unit of a row while paragraphs take a whole row.
#[derive(Clone, Debug, PartialEq)]
pub struct TextInput {
    custom_id: String,
    persistent: bool,
    label: String,
    style: TextInputStyle,
    placeholder: Option<String>,
    value: Option<String>,
    required: bool,
    min_length: Option<u16>,
    max_length: Option<u16>,
    row: Option<u8>,
    submitted: Option<String>,
}

impl TextInput {
    /// Creates a short, single line, text input.
    pub fn short(label: impl Into<String>) -> TextInputBuilder {
        TextInputBuilder::new(label.into(), TextInputStyle::Short)
    }

    /// Creates a multi line text input.
    pub fn paragraph(label: impl Into<String>) -> TextInputBuilder {
        TextInputBuilder::new(label.into(), TextInputStyle::Paragraph)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn style(&self) -> TextInputStyle {
        self.style
    }

    /// The value the input is prefilled with.
    pub fn prefilled(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The value submitted the last time the modal was sent.
    pub fn value(&self) -> Option<&str> {
        self.submitted.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl Item for TextInput {
    fn custom_id(&self) -> Option<&str> {
        Some(&self.custom_id)
    }

    fn row(&self) -> Option<u8> {
        self.row
    }

    fn width(&self) -> u8 {
        match self.style {
            TextInputStyle::Short => 1,
            _ => 5,
        }
    }

    fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn build(&self) -> Component {
        Component::TextInput(TwilightTextInput {
            custom_id: self.custom_id.clone(),
            label: self.label.clone(),
            max_length: self.max_length,
            min_length: self.min_length,
            placeholder: self.placeholder.clone(),
            required: Some(self.required),
            style: self.style,
            value: self.value.clone(),
        })
    }

    fn refresh(&mut self, event: &InteractionEvent) {
        if let EventPayload::Modal { fields } = &event.payload {
            if let Some(field) = fields.iter().find(|field| field.custom_id == self.custom_id) {
                self.submitted = field.value.clone();
            }
        }
    }
}

/// A builder used to create [text inputs](TextInput).
pub struct TextInputBuilder {
    custom_id: Option<String>,
    label: String,
    style: TextInputStyle,
    placeholder: Option<String>,
    value: Option<String>,
    required: bool,
    min_length: Option<u16>,
    max_length: Option<u16>,
    row: Option<u8>,
}

impl TextInputBuilder {
    fn new(label: String, style: TextInputStyle) -> Self {
        Self {
            custom_id: None,
            label,
            style,
            placeholder: None,
            value: None,
            required: true,
            min_length: None,
            max_length: None,
            row: None,
        }
    }

    /// Sets the custom id of the input, making it persistent.
    pub fn custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = Some(custom_id.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Prefills the input with the given value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_length(mut self, min_length: u16) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: u16) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn row(mut self, row: u8) -> Self {
        self.row = Some(row);
        self
    }

    pub fn build(self) -> Result<TextInput, ComponentError> {
        validate_row(self.row)?;
        validate_length("label", Some(&self.label), TEXT_INPUT_LABEL_LENGTH)?;
        validate_length("placeholder", self.placeholder.as_deref(), TEXT_INPUT_PLACEHOLDER_LENGTH)?;
        validate_length("value", self.value.as_deref(), TEXT_INPUT_VALUE_LENGTH as usize)?;

        let min = self.min_length.unwrap_or(0);
        let max = self.max_length.unwrap_or(TEXT_INPUT_VALUE_LENGTH);
        if min > max || max > TEXT_INPUT_VALUE_LENGTH || max == 0 {
            return Err(ComponentError::ValueRange { min, max });
        }

        let (custom_id, persistent) = resolve_custom_id(self.custom_id)?;
        let input = TextInput {
            custom_id,
            persistent,
            label: self.label,
            style: self.style,
            placeholder: self.placeholder,
            value: self.value,
            required: self.required,
            min_length: self.min_length,
            max_length: self.max_length,
            row: self.row,
            submitted: None,
        };

        twilight_validate::component::component(&Component::ActionRow(ActionRow {
            components: vec![input.build()],
        }))?;

        Ok(input)
    }
}
