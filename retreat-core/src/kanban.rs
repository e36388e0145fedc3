//! The three-column idea board.
//!
//! Cards move between `develop`, `ready` and `parking`. The board's one
//! rule: `ready` ("Ready for Action") holds at most a single card, so the
//! next step is always unambiguous. Violations are rejected before any
//! mutation happens.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RetreatError, RetreatResult};
use crate::journal::iso_now;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Develop,
    Ready,
    Parking,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Develop, Column::Ready, Column::Parking];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Develop => "develop",
            Column::Ready => "ready",
            Column::Parking => "parking",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Column::Develop => "Ideas to Develop",
            Column::Ready => "Ready for Action",
            Column::Parking => "Parking Lot",
        }
    }

    pub fn from_name(name: &str) -> RetreatResult<Column> {
        Column::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| RetreatError::Board(format!("Unknown column '{name}'")))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Creation timestamp in milliseconds; unique within the board.
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub develop: Vec<Card>,
    #[serde(default)]
    pub ready: Vec<Card>,
    #[serde(default)]
    pub parking: Vec<Card>,
}

impl Board {
    pub fn column(&self, column: Column) -> &[Card] {
        match column {
            Column::Develop => &self.develop,
            Column::Ready => &self.ready,
            Column::Parking => &self.parking,
        }
    }

    fn column_mut(&mut self, column: Column) -> &mut Vec<Card> {
        match column {
            Column::Develop => &mut self.develop,
            Column::Ready => &mut self.ready,
            Column::Parking => &mut self.parking,
        }
    }

    pub fn card_count(&self) -> usize {
        self.develop.len() + self.ready.len() + self.parking.len()
    }

    fn check_ready_capacity(&self) -> RetreatResult<()> {
        if self.ready.is_empty() {
            return Ok(());
        }
        Err(RetreatError::Board(
            "Only one card can be in Ready for Action at a time. Move the existing card first."
                .into(),
        ))
    }

    /// Add a new card and return its id.
    pub fn add_card(
        &mut self,
        title: &str,
        description: &str,
        column: Column,
    ) -> RetreatResult<i64> {
        if column == Column::Ready {
            self.check_ready_capacity()?;
        }

        let id = self.unique_card_id();
        self.column_mut(column).push(Card {
            id,
            title: title.to_string(),
            description: description.to_string(),
            created_at: iso_now(),
        });
        Ok(id)
    }

    /// Move a card between columns. Nothing changes when the move is
    /// rejected or the card isn't where the caller said it was.
    pub fn move_card(&mut self, id: i64, from: Column, to: Column) -> RetreatResult<()> {
        if to == Column::Ready {
            self.check_ready_capacity()?;
        }

        let source = self.column_mut(from);
        let index = source
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| RetreatError::Board(format!("Card {id} not found in {from}")))?;

        let card = source.remove(index);
        self.column_mut(to).push(card);
        Ok(())
    }

    pub fn delete_card(&mut self, id: i64, column: Column) -> bool {
        let cards = self.column_mut(column);
        let before = cards.len();
        cards.retain(|c| c.id != id);
        cards.len() != before
    }

    pub fn find_card(&self, id: i64) -> Option<(Column, &Card)> {
        Column::ALL.into_iter().find_map(|column| {
            self.column(column)
                .iter()
                .find(|c| c.id == id)
                .map(|c| (column, c))
        })
    }

    fn unique_card_id(&self) -> i64 {
        let mut id = Utc::now().timestamp_millis();
        while self.find_card(id).is_some() {
            id += 1;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_holds_at_most_one_card() {
        let mut board = Board::default();
        board.add_card("Launch farm stand", "", Column::Ready).unwrap();

        let err = board
            .add_card("Candle business", "", Column::Ready)
            .unwrap_err();
        assert!(err.to_string().contains("one card"));
        assert_eq!(board.ready.len(), 1);
        assert_eq!(board.card_count(), 1, "rejected add must not mutate");
    }

    #[test]
    fn test_move_into_full_ready_is_rejected_without_mutation() {
        let mut board = Board::default();
        let ready_id = board.add_card("In flight", "", Column::Ready).unwrap();
        let develop_id = board.add_card("Next up", "", Column::Develop).unwrap();

        assert!(board.move_card(develop_id, Column::Develop, Column::Ready).is_err());

        // The board is unchanged: card stayed in develop, ready untouched.
        assert_eq!(board.develop.len(), 1);
        assert_eq!(board.develop[0].id, develop_id);
        assert_eq!(board.ready.len(), 1);
        assert_eq!(board.ready[0].id, ready_id);
    }

    #[test]
    fn test_ready_invariant_holds_across_sequences() {
        let mut board = Board::default();
        let a = board.add_card("a", "", Column::Develop).unwrap();
        let b = board.add_card("b", "", Column::Parking).unwrap();

        assert!(board.move_card(a, Column::Develop, Column::Ready).is_ok());
        assert!(board.move_card(b, Column::Parking, Column::Ready).is_err());
        assert!(board.move_card(a, Column::Ready, Column::Parking).is_ok());
        assert!(board.move_card(b, Column::Parking, Column::Ready).is_ok());

        assert!(board.ready.len() <= 1);
        assert_eq!(board.card_count(), 2);
    }

    #[test]
    fn test_move_unknown_card_is_an_error() {
        let mut board = Board::default();
        board.add_card("only", "", Column::Develop).unwrap();

        let err = board
            .move_card(42, Column::Develop, Column::Parking)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert_eq!(board.develop.len(), 1);
    }

    #[test]
    fn test_card_ids_are_unique() {
        let mut board = Board::default();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(board.add_card(&format!("card {i}"), "", Column::Develop).unwrap());
        }
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());
    }

    #[test]
    fn test_delete_card() {
        let mut board = Board::default();
        let id = board.add_card("gone soon", "", Column::Parking).unwrap();

        assert!(board.delete_card(id, Column::Parking));
        assert!(!board.delete_card(id, Column::Parking));
        assert_eq!(board.card_count(), 0);
    }
}
