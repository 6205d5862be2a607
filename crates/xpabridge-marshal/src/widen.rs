//! Outbound widening of element kinds the viewer can't represent.

use crate::{ArrayBuffer, ElementKind};

/// Which kinds are widened before transmission, and to what.
///
/// The default rules are `int8 → int16`, `uint32 → int64` and
/// `float16 → float32`. No rule's target is another rule's source, so
/// applying the policy twice gives the same result as applying it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideningPolicy {
    rules: Vec<(ElementKind, ElementKind)>,
}

impl WideningPolicy {
    /// A policy that widens nothing.
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    /// The kind `kind` is sent as.
    pub fn target_for(&self, kind: ElementKind) -> ElementKind {
        self.rules
            .iter()
            .find(|(from, _)| *from == kind)
            .map_or(kind, |(_, to)| *to)
    }

    /// Widens `array` if a rule applies; otherwise returns it unchanged.
    pub fn apply(&self, array: &ArrayBuffer) -> ArrayBuffer {
        let target = self.target_for(array.kind());
        if target == array.kind() {
            array.clone()
        } else {
            tracing::debug!(from = %array.kind(), to = %target, "widening array");
            array.cast(target)
        }
    }

    pub fn rules(&self) -> &[(ElementKind, ElementKind)] {
        &self.rules
    }
}

impl Default for WideningPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                (ElementKind::I8, ElementKind::I16),
                (ElementKind::U32, ElementKind::I64),
                (ElementKind::F16, ElementKind::F32),
            ],
        }
    }
}
