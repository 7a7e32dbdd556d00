//! Sheet view state: panes, selections, splits, and frozen rows/columns.
//!
//! A [`DocumentView`] holds one lazily created [`SheetView`] per sheet plus
//! the active sheet index. Each sheet view tracks four pane records with
//! their own selections, an active-pane discriminator, and either a
//! split-pane or a frozen-pane state (mutually exclusive).

use std::collections::HashMap;

use crate::types::{Address, ColT, Range, RowT, SheetPane, SheetT};

/// Split-pane state: split positions in 1/20th of a point, plus the
/// top-left cell of the bottom-right pane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SplitPane {
    pub hor_split: f64,
    pub ver_split: f64,
    pub top_left_cell: Address,
}

/// Frozen-pane state: how many columns and rows stay visible, plus the
/// top-left cell of the scrollable pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrozenPane {
    pub visible_columns: ColT,
    pub visible_rows: RowT,
    pub top_left_cell: Address,
}

/// Either kind of pane division.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaneDivision {
    Split(SplitPane),
    Frozen(FrozenPane),
}

/// View state of one sheet.
#[derive(Debug, Default)]
pub struct SheetView {
    selections: HashMap<SheetPane, Range>,
    active_pane: Option<SheetPane>,
    division: Option<PaneDivision>,
}

impl SheetView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection of a pane; an unset pane selects its top-left cell.
    pub fn selection(&self, pane: SheetPane) -> Range {
        self.selections.get(&pane).copied().unwrap_or_default()
    }

    pub fn set_selection(&mut self, pane: SheetPane, range: Range) {
        self.selections.insert(pane, range);
    }

    pub fn set_active_pane(&mut self, pane: SheetPane) {
        self.active_pane = Some(pane);
    }

    pub fn active_pane(&self) -> SheetPane {
        self.active_pane.unwrap_or(SheetPane::TopLeft)
    }

    /// Record a split-pane state, replacing any frozen-pane state.
    pub fn set_split_pane(&mut self, hor_split: f64, ver_split: f64, top_left_cell: Address) {
        self.division = Some(PaneDivision::Split(SplitPane {
            hor_split,
            ver_split,
            top_left_cell,
        }));
    }

    /// Record a frozen-pane state, replacing any split-pane state.
    pub fn set_frozen_pane(
        &mut self,
        visible_columns: ColT,
        visible_rows: RowT,
        top_left_cell: Address,
    ) {
        self.division = Some(PaneDivision::Frozen(FrozenPane {
            visible_columns,
            visible_rows,
            top_left_cell,
        }));
    }

    pub fn split_pane(&self) -> Option<SplitPane> {
        match self.division {
            Some(PaneDivision::Split(sp)) => Some(sp),
            _ => None,
        }
    }

    pub fn frozen_pane(&self) -> Option<FrozenPane> {
        match self.division {
            Some(PaneDivision::Frozen(fp)) => Some(fp),
            _ => None,
        }
    }
}

/// View state of a whole document.
#[derive(Debug, Default)]
pub struct DocumentView {
    sheet_views: HashMap<SheetT, SheetView>,
    active_sheet: SheetT,
}

impl DocumentView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The view of a sheet, created on first access.
    pub fn get_or_create_sheet_view(&mut self, sheet: SheetT) -> &mut SheetView {
        self.sheet_views.entry(sheet).or_default()
    }

    pub fn sheet_view(&self, sheet: SheetT) -> Option<&SheetView> {
        self.sheet_views.get(&sheet)
    }

    pub fn set_active_sheet(&mut self, sheet: SheetT) {
        self.active_sheet = sheet;
    }

    pub fn active_sheet(&self) -> SheetT {
        self.active_sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_view_created_lazily() {
        let mut view = DocumentView::new();
        assert!(view.sheet_view(0).is_none());
        view.get_or_create_sheet_view(0);
        assert!(view.sheet_view(0).is_some());
    }

    #[test]
    fn test_selection_per_pane() {
        let mut sv = SheetView::new();
        let range = Range::new(Address::new(2, 1), Address::new(2, 1));
        sv.set_selection(SheetPane::BottomLeft, range);
        assert_eq!(sv.selection(SheetPane::BottomLeft), range);
        assert_eq!(sv.selection(SheetPane::TopLeft), Range::default());
    }

    #[test]
    fn test_active_pane_defaults_to_top_left() {
        let mut sv = SheetView::new();
        assert_eq!(sv.active_pane(), SheetPane::TopLeft);
        sv.set_active_pane(SheetPane::BottomRight);
        assert_eq!(sv.active_pane(), SheetPane::BottomRight);
    }

    #[test]
    fn test_split_and_frozen_are_mutually_exclusive() {
        let mut sv = SheetView::new();
        sv.set_split_pane(1200.0, 1500.0, Address::new(5, 2));
        assert!(sv.split_pane().is_some());
        assert!(sv.frozen_pane().is_none());

        sv.set_frozen_pane(2, 5, Address::new(5, 2));
        assert!(sv.split_pane().is_none());
        let fp = sv.frozen_pane().unwrap();
        assert_eq!(fp.visible_columns, 2);
        assert_eq!(fp.visible_rows, 5);
    }

    #[test]
    fn test_active_sheet_tracking() {
        let mut view = DocumentView::new();
        assert_eq!(view.active_sheet(), 0);
        view.set_active_sheet(2);
        assert_eq!(view.active_sheet(), 2);
    }
}
