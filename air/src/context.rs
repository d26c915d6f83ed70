//! The string-keyed registry auto-generated AIRs use to wire virtual
//! columns and other typed objects to their components. All lookups happen
//! once at setup, so the type-erased table costs nothing in hot paths.

use std::any::Any;
use std::collections::HashMap;

use quarry_util::{Error, Result};

use crate::virtual_column::VirtualColumn;

#[derive(Default)]
pub struct TraceGenerationContext {
    virtual_columns: HashMap<String, VirtualColumn>,
    objects: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl TraceGenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_virtual_column(&mut self, name: &str, column: VirtualColumn) {
        let previous = self.virtual_columns.insert(name.to_string(), column);
        assert!(previous.is_none(), "virtual column {name:?} registered twice");
    }

    pub fn get_virtual_column(&self, name: &str) -> Result<VirtualColumn> {
        self.virtual_columns
            .get(name)
            .copied()
            .ok_or_else(|| Error::InvalidParameter(format!("unknown virtual column {name:?}")))
    }

    /// Registers an arbitrary typed object under `name`.
    pub fn add_object<T: Any + Send + Sync>(&mut self, name: &str, object: T) {
        let previous = self.objects.insert(name.to_string(), Box::new(object));
        assert!(previous.is_none(), "object {name:?} registered twice");
    }

    /// Runtime-checked extraction: the stored object must have been
    /// registered with exactly the requested type.
    pub fn get_object<T: Any + Send + Sync>(&self, name: &str) -> Result<&T> {
        let object = self
            .objects
            .get(name)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown context object {name:?}")))?;
        object.downcast_ref::<T>().ok_or_else(|| {
            Error::InvalidParameter(format!("context object {name:?} has a different type"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_column_round_trip() {
        let mut ctx = TraceGenerationContext::new();
        ctx.add_virtual_column("mem/addr", VirtualColumn::new(0, 2, 0));
        ctx.add_virtual_column("mem/value", VirtualColumn::new(0, 2, 1));
        assert_eq!(ctx.get_virtual_column("mem/addr").unwrap(), VirtualColumn::new(0, 2, 0));
        assert!(ctx.get_virtual_column("missing").is_err());
    }

    #[test]
    fn typed_objects_check_their_type() {
        let mut ctx = TraceGenerationContext::new();
        ctx.add_object("n_steps", 1024usize);
        assert_eq!(*ctx.get_object::<usize>("n_steps").unwrap(), 1024);
        assert!(ctx.get_object::<u32>("n_steps").is_err());
        assert!(ctx.get_object::<usize>("missing").is_err());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut ctx = TraceGenerationContext::new();
        ctx.add_object("key", 1u8);
        ctx.add_object("key", 2u8);
    }
}
