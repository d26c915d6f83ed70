//! Traces and the AIR contract: the constraint-system surface the
//! composition, FRI and orchestration layers consume, plus the trace
//! generation components (virtual columns, typed context, memory cells)
//! that concrete systems build on.

mod air;
mod boundary;
mod context;
mod fibonacci;
mod memory_cell;
mod trace;
mod virtual_column;

pub use air::{degree_adjustment_factor, Air, InteractionParams};
pub use boundary::{BoundaryAir, BoundaryCondition};
pub use context::TraceGenerationContext;
pub use fibonacci::FibonacciAir;
pub use memory_cell::MemoryCell;
pub use trace::Trace;
pub use virtual_column::{RowView, VirtualColumn};
