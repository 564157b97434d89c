//! Grid composition of positioned text.
//!
//! Fragments with known coordinates are laid into a row/column grid. Columns that are
//! empty across the whole grid are removed first, then rows with nothing left, and the
//! remainder is serialized as tab-separated lines. Fragments without coordinates are
//! listed separately so they never distort the grid.
//!
//! The grid is stored sparsely; a shape anchored at row one million does not allocate a
//! million empty rows. Serialization is identical to the dense layout with empty rows and
//! columns pruned.

use crate::types::PositionedFragment;
use ahash::AHashSet;
use std::collections::{BTreeMap, BTreeSet};

/// Output of [`compose`]. Either half may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    /// Tab/newline grid, one line per non-empty row, each line newline-terminated.
    pub grid: String,
    /// Distinct texts of fragments without coordinates, in first-seen order.
    pub unpositioned: Vec<String>,
}

impl Composition {
    pub fn is_empty(&self) -> bool {
        self.grid.trim().is_empty() && self.unpositioned.is_empty()
    }

    /// Unpositioned texts as a newline-separated list.
    pub fn auxiliary_text(&self) -> String {
        self.unpositioned.join("\n")
    }

    /// Grid followed by the unpositioned list, trimmed. Used where shapes are pooled for the
    /// whole document rather than bucketed per sheet.
    pub fn pooled_text(&self) -> String {
        let mut text = self.grid.clone();
        if !self.unpositioned.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&self.auxiliary_text());
        }
        text.trim().to_string()
    }
}

/// Compose fragments for one sheet or slide.
///
/// Placement depends only on coordinates, so the grid is independent of input order except
/// where several fragments share a cell: those are space-joined in input order.
pub fn compose(fragments: &[PositionedFragment]) -> Composition {
    let mut cells: BTreeMap<(u32, u32), String> = BTreeMap::new();
    let mut unpositioned = Vec::new();
    let mut seen_unpositioned = AHashSet::new();

    for fragment in fragments {
        match fragment.position() {
            Some(position) => {
                let cell = cells.entry(position).or_default();
                if !fragment.text.is_empty() {
                    if !cell.is_empty() {
                        cell.push(' ');
                    }
                    cell.push_str(&fragment.text);
                }
            }
            None => {
                if seen_unpositioned.insert(fragment.text.as_str()) {
                    unpositioned.push(fragment.text.clone());
                }
            }
        }
    }

    Composition {
        grid: serialize_cells(&cells),
        unpositioned,
    }
}

/// Serialize sparse cells, pruning empty columns globally and then empty rows.
pub fn serialize_cells(cells: &BTreeMap<(u32, u32), String>) -> String {
    let kept_columns: BTreeSet<u32> = cells
        .iter()
        .filter(|(_, text)| !text.is_empty())
        .map(|((_, col), _)| *col)
        .collect();
    if kept_columns.is_empty() {
        return String::new();
    }

    let mut rows: BTreeMap<u32, BTreeMap<u32, &str>> = BTreeMap::new();
    for ((row, col), text) in cells {
        if !text.is_empty() {
            rows.entry(*row).or_default().insert(*col, text.as_str());
        }
    }

    let mut output = String::new();
    for row_cells in rows.values() {
        let line = kept_columns
            .iter()
            .map(|col| row_cells.get(col).copied().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\t");
        let line = line.trim_end_matches('\t');
        if line.is_empty() {
            continue;
        }
        output.push_str(line);
        output.push('\n');
    }

    if output.trim().is_empty() {
        return String::new();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_column_is_pruned() {
        let composition = compose(&[PositionedFragment::at(0, 0, "A"), PositionedFragment::at(0, 2, "B")]);
        assert_eq!(composition.grid, "A\tB\n");
        assert!(composition.unpositioned.is_empty());
    }

    #[test]
    fn test_empty_rows_are_pruned_and_columns_stay_aligned() {
        let composition = compose(&[
            PositionedFragment::at(0, 0, "Problem"),
            PositionedFragment::at(4, 3, "Solution"),
            PositionedFragment::at(9, 0, "Team"),
        ]);
        assert_eq!(composition.grid, "Problem\n\tSolution\nTeam\n");
    }

    #[test]
    fn test_column_pruning_is_global_not_per_row() {
        let composition = compose(&[
            PositionedFragment::at(0, 0, "a"),
            PositionedFragment::at(0, 2, "c"),
            PositionedFragment::at(1, 1, "b"),
        ]);
        assert_eq!(composition.grid, "a\t\tc\n\tb\n");
    }

    #[test]
    fn test_grid_is_independent_of_input_order() {
        let fragments = vec![
            PositionedFragment::at(3, 1, "Revenue"),
            PositionedFragment::at(0, 0, "Title"),
            PositionedFragment::at(3, 4, "Costs"),
            PositionedFragment::at(7, 2, "Ask"),
            PositionedFragment::at(0, 4, "Date"),
        ];
        let expected = compose(&fragments);

        let mut reversed = fragments.clone();
        reversed.reverse();
        assert_eq!(compose(&reversed), expected);

        let mut rotated = fragments.clone();
        rotated.rotate_left(2);
        assert_eq!(compose(&rotated), expected);
    }

    #[test]
    fn test_same_cell_fragments_join_in_input_order() {
        let first = compose(&[PositionedFragment::at(1, 1, "Seed"), PositionedFragment::at(1, 1, "round")]);
        assert_eq!(first.grid, "Seed round\n");

        let swapped = compose(&[PositionedFragment::at(1, 1, "round"), PositionedFragment::at(1, 1, "Seed")]);
        assert_eq!(swapped.grid, "round Seed\n");
    }

    #[test]
    fn test_unpositioned_are_deduplicated_by_text() {
        let composition = compose(&[
            PositionedFragment::unpositioned("Legacy"),
            PositionedFragment::at(0, 0, "Legacy"),
            PositionedFragment::unpositioned("Other"),
            PositionedFragment::unpositioned("Legacy"),
        ]);
        assert_eq!(composition.grid, "Legacy\n");
        assert_eq!(composition.unpositioned, vec!["Legacy".to_string(), "Other".to_string()]);
        assert_eq!(composition.auxiliary_text(), "Legacy\nOther");
    }

    #[test]
    fn test_half_known_coordinates_count_as_unpositioned() {
        let fragment = PositionedFragment {
            row: Some(2),
            col: None,
            text: "Floating".to_string(),
        };
        let composition = compose(&[fragment]);
        assert_eq!(composition.grid, "");
        assert_eq!(composition.unpositioned, vec!["Floating".to_string()]);
    }

    #[test]
    fn test_blank_grid_is_suppressed() {
        let composition = compose(&[PositionedFragment::at(5, 5, "")]);
        assert_eq!(composition.grid, "");
        assert!(composition.is_empty());
        assert!(compose(&[]).is_empty());
    }

    #[test]
    fn test_pooled_text_appends_unpositioned_after_grid() {
        let composition = compose(&[
            PositionedFragment::unpositioned("Callout"),
            PositionedFragment::at(0, 1, "Box"),
        ]);
        assert_eq!(composition.pooled_text(), "Box\n\nCallout");
        assert_eq!(compose(&[PositionedFragment::unpositioned("Only")]).pooled_text(), "Only");
    }

    #[test]
    fn test_far_anchor_does_not_allocate_dense_grid() {
        let composition = compose(&[
            PositionedFragment::at(1_048_575, 16_383, "Far"),
            PositionedFragment::at(0, 0, "Near"),
        ]);
        assert_eq!(composition.grid, "Near\n\tFar\n");
    }
}
