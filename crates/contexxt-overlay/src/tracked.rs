use contexxt_protocols::{NodeId, PointerKind};

/// Hover state of one overlay, shared between its element and its container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HoverState {
    #[default]
    Idle,
    Active,
}

impl HoverState {
    /// Next state after the pointer crosses the element or container boundary.
    ///
    /// `into_partner` is set when a leave lands on the other half of the
    /// pair (element to its overlay or back); that crossing keeps the state.
    pub fn next(self, kind: PointerKind, into_partner: bool) -> Self {
        match kind {
            PointerKind::Enter => HoverState::Active,
            PointerKind::Leave if into_partner => self,
            PointerKind::Leave => HoverState::Idle,
        }
    }

    pub fn is_active(self) -> bool {
        self == HoverState::Active
    }
}

/// One monitored media element and the container that annotates it.
#[derive(Debug, Clone)]
pub(crate) struct TrackedOverlay {
    pub target: NodeId,
    pub container: NodeId,
    pub hover: HoverState,
}

impl TrackedOverlay {
    pub fn new(target: NodeId, container: NodeId) -> Self {
        Self {
            target,
            container,
            hover: HoverState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_activates() {
        assert_eq!(HoverState::Idle.next(PointerKind::Enter, false), HoverState::Active);
        assert_eq!(HoverState::Active.next(PointerKind::Enter, true), HoverState::Active);
    }

    #[test]
    fn test_leave_into_partner_keeps_state() {
        assert_eq!(HoverState::Active.next(PointerKind::Leave, true), HoverState::Active);
        assert_eq!(HoverState::Active.next(PointerKind::Leave, false), HoverState::Idle);
    }
}
