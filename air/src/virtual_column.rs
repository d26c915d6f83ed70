//! Row views and virtual columns: a virtual column is an arithmetic
//! progression of rows inside one physical column, the unit trace
//! generators write through.

use quarry_field::Field;
use quarry_util::math::safe_div;

use crate::trace::Trace;

/// An infinite arithmetic progression of row indices:
/// `offset, offset + step, offset + 2 * step, ...`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowView {
    pub step: u64,
    pub offset: u64,
}

impl RowView {
    pub fn new(step: u64, offset: u64) -> Self {
        assert!(offset < step, "offset must be smaller than the step");
        Self { step, offset }
    }

    /// The number of view rows inside a trace of `original_length` rows.
    pub fn size(&self, original_length: u64) -> u64 {
        safe_div(original_length, self.step)
    }

    /// The trace row of view index `index`.
    pub fn at(&self, index: u64) -> u64 {
        self.offset + index * self.step
    }

    /// The view index of a trace row that lies on the progression.
    pub fn index_of(&self, element: u64) -> u64 {
        safe_div(element - self.offset, self.step)
    }

    /// Expresses `subview` (a sub-progression of this view) relative to
    /// this view's indices.
    pub fn relative(&self, subview: &RowView) -> RowView {
        RowView {
            step: safe_div(subview.step, self.step),
            offset: self.index_of(subview.offset),
        }
    }
}

/// A row view bound to a physical column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VirtualColumn {
    pub column: usize,
    pub view: RowView,
}

impl VirtualColumn {
    pub fn new(column: usize, step: u64, row_offset: u64) -> Self {
        Self { column, view: RowView::new(step, row_offset) }
    }

    pub fn size(&self, trace_length: u64) -> u64 {
        self.view.size(trace_length)
    }

    pub fn to_trace_row(&self, row: u64) -> u64 {
        self.view.at(row)
    }

    pub fn set_cell<F: Field>(&self, trace: &mut Trace<F>, row: u64, value: F) {
        trace.set(self.column, self.view.at(row) as usize, value);
    }

    pub fn get_cell<F: Field>(&self, trace: &Trace<F>, row: u64) -> F {
        trace.get(self.column, self.view.at(row) as usize)
    }
}
