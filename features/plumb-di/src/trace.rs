use std::{fmt::Debug, sync::Arc};

use crate::{info::CallableInfo, types::Values};

/// One frame of a failed injection
///
/// The outermost frame is the root, each `origin` points to the nested injection during
/// which the failure happened. `origin` is `None` where the callable itself (or the
/// resolution of its own parameters) failed.
#[derive(Clone)]
pub struct InjectionTrace {
    pub info: Arc<CallableInfo>,
    /// Values resolved for this frame before the failure
    pub values: Values,
    pub origin: Option<Box<InjectionTrace>>,
}

impl InjectionTrace {
    /// Iterates the chain from this frame down to the innermost cause
    pub fn frames(&self) -> Frames<'_> {
        Frames { next: Some(self) }
    }

    /// The frame in which the failure actually occurred
    pub fn innermost(&self) -> &InjectionTrace {
        let mut frame = self;
        while let Some(origin) = frame.origin.as_deref() {
            frame = origin;
        }
        frame
    }

    pub fn depth(&self) -> usize {
        self.frames().count()
    }
}

pub struct Frames<'a> {
    next: Option<&'a InjectionTrace>,
}
impl<'a> Iterator for Frames<'a> {
    type Item = &'a InjectionTrace;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.origin.as_deref();
        Some(current)
    }
}

impl Debug for InjectionTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionTrace")
            .field("call", &self.info.name())
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .field("origin", &self.origin)
            .finish()
    }
}

impl std::fmt::Display for InjectionTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("Injection trace (outermost first):".to_string());
        for (depth, frame) in self.frames().enumerate() {
            let values = frame
                .values
                .iter()
                .map(|(name, value)| format!("{name}: {}", value.info))
                .collect::<Vec<_>>();
            display.push(format!(
                "{}- {} with {{{}}}",
                "  ".repeat(depth),
                frame.info.name(),
                values.join(", ")
            ));
        }
        f.write_str(&display.join("\n"))
    }
}
