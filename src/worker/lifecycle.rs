use serde::{Deserialize, Serialize};

/// Service worker lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Script evaluated, install not started
    Parsed,
    Installing,
    /// Installed and waiting to activate
    Installed,
    Activating,
    /// Controlling pages and receiving fetch and push events
    Activated,
    /// Replaced or failed to install
    Redundant,
}

impl WorkerState {
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (_, Redundant)
        ) && !self.is_terminal()
    }

    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Redundant)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerState::*;

    #[test]
    fn it_allows_forward_transitions_only() {
        assert!(Parsed.can_transition_to(Installing));
        assert!(Installing.can_transition_to(Installed));
        assert!(Installed.can_transition_to(Activating));
        assert!(Activating.can_transition_to(Activated));

        assert!(!Parsed.can_transition_to(Activated));
        assert!(!Activated.can_transition_to(Installing));
        assert!(!Installed.can_transition_to(Installed));
    }

    #[test]
    fn it_treats_redundant_as_terminal() {
        assert!(Activated.can_transition_to(Redundant));
        assert!(!Redundant.can_transition_to(Redundant));
        assert!(!Redundant.can_transition_to(Installing));
    }

    #[test]
    fn it_only_intercepts_fetch_when_activated() {
        assert!(Activated.can_intercept_fetch());
        assert!(!Installed.can_intercept_fetch());
    }
}
