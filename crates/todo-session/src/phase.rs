use std::sync::atomic::{AtomicBool, Ordering};

/// Host lifecycle stage. Storage and sign-in are only reachable once
/// `Interactive`; the transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Prerendering,
    Interactive,
}

#[derive(Debug, Default)]
pub(crate) struct PhaseGate {
    interactive: AtomicBool,
}

impl PhaseGate {
    pub(crate) fn new(phase: RenderPhase) -> Self {
        Self {
            interactive: AtomicBool::new(phase == RenderPhase::Interactive),
        }
    }

    pub(crate) fn phase(&self) -> RenderPhase {
        if self.interactive.load(Ordering::Acquire) {
            RenderPhase::Interactive
        } else {
            RenderPhase::Prerendering
        }
    }

    pub(crate) fn is_interactive(&self) -> bool {
        self.phase() == RenderPhase::Interactive
    }

    /// Returns true only for the call that performed the transition.
    pub(crate) fn enter_interactive(&self) -> bool {
        !self.interactive.swap(true, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_is_one_way() {
        let gate = PhaseGate::new(RenderPhase::Prerendering);
        assert_eq!(gate.phase(), RenderPhase::Prerendering);
        assert!(gate.enter_interactive());
        assert!(!gate.enter_interactive());
        assert!(gate.is_interactive());
    }
}
