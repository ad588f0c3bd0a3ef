//! Row placement of items.
//!
//! Every handler renders at most [`ROW_COUNT`] action rows, each one [`ROW_WIDTH`] units
//! wide. Items are placed in insertion order: those asking for a row go there, the rest go
//! on the first row with enough room. Placed items never move to make room for later ones.

use crate::{
    error::LayoutError,
    item::Item,
    twilight_exports::{ActionRow, Component},
};

pub const ROW_COUNT: usize = 5;
pub const ROW_WIDTH: u8 = 5;
pub const MAX_ITEMS: usize = 25;

/// The used width of every row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowWeights {
    weights: [u8; ROW_COUNT],
}

impl RowWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// The width already taken in the given row.
    pub fn weight(&self, row: u8) -> u8 {
        self.weights.get(row as usize).copied().unwrap_or(ROW_WIDTH)
    }

    /// Places an item of the given width, returning the row it ended on.
    pub fn place(&mut self, row: Option<u8>, width: u8) -> Result<u8, LayoutError> {
        match row {
            Some(row) => self.place_at(row, width),
            None => self.place_anywhere(width),
        }
    }

    fn place_at(&mut self, row: u8, width: u8) -> Result<u8, LayoutError> {
        let weight = self
            .weights
            .get_mut(row as usize)
            .ok_or(LayoutError::InvalidRow(row))?;

        if *weight + width > ROW_WIDTH {
            return Err(LayoutError::RowFull { row, width });
        }

        *weight += width;
        Ok(row)
    }

    fn place_anywhere(&mut self, width: u8) -> Result<u8, LayoutError> {
        let (row, weight) = self
            .weights
            .iter_mut()
            .enumerate()
            .find(|(_, weight)| **weight + width <= ROW_WIDTH)
            .ok_or(LayoutError::HandlerFull { width })?;

        *weight += width;
        Ok(row as u8)
    }
}

/// Computes the row of every item from scratch, keeping the order of the input.
pub fn assign_rows<'a, I, It>(items: It) -> Result<Vec<u8>, LayoutError>
where
    I: Item + 'a,
    It: IntoIterator<Item = &'a I>,
{
    let items = items.into_iter().collect::<Vec<_>>();
    if items.len() > MAX_ITEMS {
        return Err(LayoutError::TooManyItems { count: items.len() });
    }

    let mut weights = RowWeights::new();
    let mut rows = vec![0; items.len()];

    for (index, item) in items.iter().enumerate() {
        rows[index] = weights.place(item.row(), item.width())?;
    }

    Ok(rows)
}

/// Groups the given items into action rows, skipping empty rows.
pub fn build_rows<'a, I, It>(placed: It) -> Vec<Component>
where
    I: Item + 'a,
    It: IntoIterator<Item = (&'a I, u8)>,
{
    let mut rows: [Vec<Component>; ROW_COUNT] = Default::default();

    for (item, row) in placed {
        if let Some(components) = rows.get_mut(row as usize) {
            components.push(item.build());
        }
    }

    rows.into_iter()
        .filter(|components| !components.is_empty())
        .map(|components| Component::ActionRow(ActionRow { components }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        button::Button,
        item::ViewItem,
        select::{Select, SelectOption},
    };

    fn button(row: Option<u8>) -> Button {
        let builder = Button::builder().label("x");
        let builder = match row {
            Some(row) => builder.row(row),
            None => builder,
        };
        builder.build().unwrap()
    }

    fn wide_select(row: Option<u8>) -> Select {
        let builder = Select::text(vec![SelectOption::new("One")]);
        let builder = match row {
            Some(row) => builder.row(row),
            None => builder,
        };
        builder.build().unwrap()
    }

    #[test]
    fn auto_items_fill_rows_in_order() {
        let items = (0..7).map(|_| button(None)).collect::<Vec<_>>();
        let rows = assign_rows(&items).unwrap();

        assert_eq!(rows, [0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn explicit_rows_share_room_with_earlier_items() {
        let items = vec![button(None), button(Some(0)), button(Some(0)), button(None)];
        let rows = assign_rows(&items).unwrap();

        assert_eq!(rows, [0, 0, 0, 0]);
    }

    #[test]
    fn placed_items_are_never_moved() {
        let items = vec![
            ViewItem::from(button(None)),
            ViewItem::from(wide_select(Some(0))),
        ];

        assert_eq!(
            assign_rows(&items),
            Err(LayoutError::RowFull { row: 0, width: 5 })
        );
    }

    #[test]
    fn auto_items_skip_full_explicit_rows() {
        let items = vec![
            ViewItem::from(wide_select(Some(0))),
            ViewItem::from(button(None)),
        ];

        assert_eq!(assign_rows(&items), Ok(vec![0, 1]));
    }

    #[test]
    fn full_rows_are_reported() {
        let items = (0..6).map(|_| button(Some(2))).collect::<Vec<_>>();

        assert_eq!(
            assign_rows(&items),
            Err(LayoutError::RowFull { row: 2, width: 1 })
        );
    }

    #[test]
    fn twenty_six_items_never_fit() {
        let items = (0..26).map(|_| button(None)).collect::<Vec<_>>();

        assert_eq!(
            assign_rows(&items),
            Err(LayoutError::TooManyItems { count: 26 })
        );
    }

    #[test]
    fn wide_items_take_whole_rows() {
        let mut weights = RowWeights::new();

        assert_eq!(weights.place(None, 1), Ok(0));
        assert_eq!(weights.place(None, 5), Ok(1));
        assert_eq!(weights.place(None, 4), Ok(0));
        assert_eq!(weights.weight(0), 5);
        assert_eq!(weights.weight(1), 5);
        assert_eq!(weights.place(Some(1), 1), Err(LayoutError::RowFull { row: 1, width: 1 }));
        assert_eq!(weights.place(Some(7), 1), Err(LayoutError::InvalidRow(7)));

        for row in 2..5 {
            assert_eq!(weights.place(None, 5), Ok(row));
        }
        assert_eq!(weights.place(None, 1), Err(LayoutError::HandlerFull { width: 1 }));
    }

    #[test]
    fn empty_rows_are_skipped_when_building() {
        let items = vec![button(Some(3)), button(Some(1)), button(Some(3))];
        let rows = assign_rows(&items).unwrap();
        let built = build_rows(items.iter().zip(rows));

        assert_eq!(built.len(), 2);
        match &built[0] {
            Component::ActionRow(row) => assert_eq!(row.components.len(), 1),
            other => panic!("expected an action row, got {other:?}"),
        }
        match &built[1] {
            Component::ActionRow(row) => assert_eq!(row.components.len(), 2),
            other => panic!("expected an action row, got {other:?}"),
        }
    }

    #[test]
    fn nothing_is_built_without_items() {
        assert!(build_rows::<Button, _>(Vec::new()).is_empty());
    }
}
