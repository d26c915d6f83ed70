//! A memory cell trace component: paired address/value virtual columns that
//! accept concurrent writes during trace generation, then finalize by
//! filling unused slots so the address column covers a contiguous range.

use std::sync::Mutex;

use quarry_field::Field;

use quarry_util::{Error, Result};

use crate::context::TraceGenerationContext;
use crate::trace::Trace;
use crate::virtual_column::{RowView, VirtualColumn};

struct MemoryCellData<F: Field> {
    address: Vec<u64>,
    value: Vec<F>,
    is_initialized: Vec<bool>,
    address_min: u64,
    address_max: u64,
}

pub struct MemoryCell<F: Field> {
    address_vc: VirtualColumn,
    value_vc: VirtualColumn,
    // The lock is only taken during trace generation; the FFT/FRI phases
    // never touch cells.
    data: Mutex<MemoryCellData<F>>,
}

impl<F: Field> MemoryCell<F> {
    /// Resolves `name/addr` and `name/value` virtual columns from the
    /// context.
    pub fn new(name: &str, ctx: &TraceGenerationContext, trace_length: u64) -> Result<Self> {
        let address_vc = ctx.get_virtual_column(&format!("{name}/addr"))?;
        let value_vc = ctx.get_virtual_column(&format!("{name}/value"))?;
        let size = address_vc.size(trace_length) as usize;
        Ok(Self {
            address_vc,
            value_vc,
            data: Mutex::new(MemoryCellData {
                address: vec![0; size],
                value: vec![F::zero(); size],
                is_initialized: vec![false; size],
                address_min: u64::MAX,
                address_max: 0,
            }),
        })
    }

    pub fn size(&self) -> usize {
        self.data.lock().unwrap().address.len()
    }

    pub fn relative_subview(&self, subview: &RowView) -> RowView {
        self.address_vc.view.relative(subview)
    }

    /// Records an access at cell `index`. Double writes are logic errors.
    pub fn write_trace(&self, index: u64, address: u64, value: F) {
        let mut data = self.data.lock().unwrap();
        let slot = index as usize;
        assert!(!data.is_initialized[slot], "memory cell {index} written twice");
        data.is_initialized[slot] = true;
        data.address[slot] = address;
        data.value[slot] = value;
        data.address_min = data.address_min.min(address);
        data.address_max = data.address_max.max(address);
    }

    /// Fills every untouched slot so the address column covers
    /// `[address_min, address_max]` with zero values on the filled holes.
    /// Fails when the untouched slots cannot absorb all the holes.
    pub fn finalize(&self) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        if data.address_min > data.address_max {
            // No writes at all; nothing to cover.
            return Ok(());
        }
        let mut seen =
            vec![false; (data.address_max - data.address_min + 1) as usize];
        for (slot, &initialized) in data.is_initialized.iter().enumerate() {
            if initialized {
                seen[(data.address[slot] - data.address_min) as usize] = true;
            }
        }
        let address_min = data.address_min;
        let mut holes = seen
            .iter()
            .enumerate()
            .filter(|(_, &s)| !s)
            .map(|(i, _)| address_min + i as u64);

        for slot in 0..data.address.len() {
            if data.is_initialized[slot] {
                continue;
            }
            // Spare slots take the missing addresses first, then repeat the
            // minimal address.
            let address = holes.next().unwrap_or(address_min);
            data.address[slot] = address;
            data.value[slot] = F::zero();
            data.is_initialized[slot] = true;
        }
        if holes.next().is_some() {
            return Err(Error::InvalidParameter(
                "not enough spare memory slots to fill the address gaps".to_string(),
            ));
        }
        Ok(())
    }

    /// Writes the address and value columns through their virtual columns.
    pub fn write_into(&self, trace: &mut Trace<F>) {
        let data = self.data.lock().unwrap();
        for slot in 0..data.address.len() {
            self.address_vc
                .set_cell(trace, slot as u64, F::from_u64(data.address[slot]));
            self.value_vc.set_cell(trace, slot as u64, data.value[slot]);
        }
    }

    /// The recorded accesses: (addresses, values).
    pub fn consume(self) -> (Vec<u64>, Vec<F>) {
        let data = self.data.into_inner().unwrap();
        (data.address, data.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type F = quarry_field::TestField;

    fn make_cell(size_log2: u64) -> MemoryCell<F> {
        let mut ctx = TraceGenerationContext::new();
        ctx.add_virtual_column("mem/addr", VirtualColumn::new(0, 2, 0));
        ctx.add_virtual_column("mem/value", VirtualColumn::new(0, 2, 1));
        MemoryCell::new("mem", &ctx, 1 << size_log2).unwrap()
    }

    #[test]
    fn finalize_fills_address_holes_with_zero_values() {
        // 8 slots; writes touch addresses {10, 12, 14}; holes 11 and 13 get
        // filled into spare slots.
        let cell = make_cell(4);
        cell.write_trace(0, 10, F::from_u64(100));
        cell.write_trace(3, 12, F::from_u64(200));
        cell.write_trace(5, 14, F::from_u64(300));
        cell.finalize().unwrap();
        let (addresses, values) = cell.consume();

        for addr in 10..=14 {
            assert!(addresses.contains(&addr), "address {addr} missing");
        }
        // Every filled hole carries a zero value.
        for (slot, &addr) in addresses.iter().enumerate() {
            if (addr == 11 || addr == 13) && values[slot] != F::zero() {
                panic!("hole filled with nonzero value");
            }
        }
    }

    #[test]
    fn finalize_fails_without_enough_spare_capacity() {
        // 4 slots, 2 writes at far-apart addresses: 97 holes, 2 spares.
        let cell = make_cell(3);
        cell.write_trace(0, 0, F::from_u64(1));
        cell.write_trace(1, 99, F::from_u64(2));
        assert!(cell.finalize().is_err());
    }

    #[test]
    fn untouched_cell_finalizes_trivially() {
        let cell = make_cell(3);
        assert!(cell.finalize().is_ok());
    }

    #[test]
    #[should_panic(expected = "written twice")]
    fn double_write_is_detected() {
        let cell = make_cell(3);
        cell.write_trace(2, 5, F::from_u64(1));
        cell.write_trace(2, 5, F::from_u64(1));
    }

    #[test]
    fn concurrent_writes_from_threads() {
        let cell = make_cell(5);
        std::thread::scope(|scope| {
            let cell_ref = &cell;
            scope.spawn(move || {
                for i in 0..8 {
                    cell_ref.write_trace(i, 20 + i, F::from_u64(i));
                }
            });
            scope.spawn(move || {
                for i in 8..16 {
                    cell_ref.write_trace(i, 20 + i, F::from_u64(i));
                }
            });
        });
        cell.finalize().unwrap();
        let (addresses, _) = cell.consume();
        for addr in 20..36 {
            assert!(addresses.contains(&addr));
        }
    }

    #[test]
    fn write_into_uses_the_virtual_columns() {
        let cell = make_cell(3);
        cell.write_trace(1, 42, F::from_u64(7));
        cell.finalize().unwrap();
        let mut trace = Trace::<F>::zeroed(1, 8);
        cell.write_into(&mut trace);
        // Slot 1 of the addr view (step 2, offset 0) is trace row 2; the
        // value view (offset 1) writes row 3.
        assert_eq!(trace.get(0, 2), F::from_u64(42));
        assert_eq!(trace.get(0, 3), F::from_u64(7));
    }
}
