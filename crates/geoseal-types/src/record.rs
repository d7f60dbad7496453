//! Raw input records and spatial cell tokens.

use crate::config::GridParams;
use serde::{Deserialize, Serialize};

/// A geo-tagged record as supplied by the data owner.
///
/// `keywords` is a free-text field; it is normalized and tokenized before
/// being inserted into the keyword filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub keywords: String,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, x: f64, y: f64, keywords: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            keywords: keywords.into(),
        }
    }

    /// The exact-coordinate token inserted into the spatial filter.
    pub fn coord_token(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// The grid cell token for this record under the given grid.
    pub fn cell_token(&self, grid: &GridParams) -> String {
        cell_token(self.x, self.y, grid)
    }
}

/// Grid cell token for a coordinate pair: `CELL:R{row}_C{col}`.
pub fn cell_token(x: f64, y: f64, grid: &GridParams) -> String {
    let row = (x / grid.cell_size_lat).floor() as i64;
    let col = (y / grid.cell_size_lon).floor() as i64;
    format!("CELL:R{}_C{}", row, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_token_floor() {
        let grid = GridParams::default();
        assert_eq!(cell_token(0.1, 0.1, &grid), "CELL:R0_C0");
        assert_eq!(cell_token(0.6, 0.6, &grid), "CELL:R1_C1");
        assert_eq!(cell_token(-0.1, 0.1, &grid), "CELL:R-1_C0");
    }

    #[test]
    fn test_record_tokens() {
        let rec = RawRecord::new("A", 0.3, 0.1, "HOSPITAL");
        assert_eq!(rec.coord_token(), "0.3,0.1");
        assert_eq!(rec.cell_token(&GridParams::default()), "CELL:R0_C0");
    }
}
