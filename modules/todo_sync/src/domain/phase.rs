//! Per-task lifecycle used to drive optimistic mutations.
//!
//! Every in-flight change moves a task into a transitional phase and the
//! backend outcome settles it. Rollback is the `Failed` transition, not an
//! ad hoc inverse assignment at the call site.

use std::fmt;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    PendingCreate,
    Persisted,
    Toggling,
    Updating,
    Deleting,
    /// Last optimistic change was reverted; the task shows its last confirmed state.
    RolledBack,
    Removed,
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    BeginToggle,
    BeginUpdate,
    BeginDelete,
    Confirmed,
    Failed,
}

impl TaskPhase {
    pub fn on(self, event: PhaseEvent) -> Result<TaskPhase, DomainError> {
        use PhaseEvent::*;
        use TaskPhase::*;

        let next = match (self, event) {
            (PendingCreate, Confirmed) => Persisted,
            (PendingCreate, Failed) => Discarded,

            (Persisted | RolledBack, BeginToggle) => Toggling,
            (Persisted | RolledBack, BeginUpdate) => Updating,
            (Persisted | RolledBack, BeginDelete) => Deleting,

            (Toggling | Updating, Confirmed) => Persisted,
            (Toggling | Updating, Failed) => RolledBack,

            (Deleting, Confirmed) => Removed,
            // the task was never taken out of the list
            (Deleting, Failed) => Persisted,

            (from, event) => {
                return Err(DomainError::InvalidTransition {
                    from: from.to_string(),
                    event: format!("{event:?}"),
                })
            }
        };
        Ok(next)
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskPhase::PendingCreate => "pending-create",
            TaskPhase::Persisted => "persisted",
            TaskPhase::Toggling => "toggling",
            TaskPhase::Updating => "updating",
            TaskPhase::Deleting => "deleting",
            TaskPhase::RolledBack => "rolled-back",
            TaskPhase::Removed => "removed",
            TaskPhase::Discarded => "discarded",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::PhaseEvent::*;
    use super::TaskPhase::*;
    use super::*;

    #[test]
    fn toggle_confirms_or_rolls_back() {
        let toggling = Persisted.on(BeginToggle).unwrap();
        assert_eq!(toggling, Toggling);
        assert_eq!(toggling.on(Confirmed).unwrap(), Persisted);
        assert_eq!(toggling.on(Failed).unwrap(), RolledBack);
    }

    #[test]
    fn rolled_back_task_accepts_new_mutations() {
        assert_eq!(RolledBack.on(BeginToggle).unwrap(), Toggling);
        assert_eq!(RolledBack.on(BeginDelete).unwrap(), Deleting);
    }

    #[test]
    fn failed_delete_keeps_task_persisted() {
        let deleting = Persisted.on(BeginDelete).unwrap();
        assert_eq!(deleting.on(Failed).unwrap(), Persisted);
        assert_eq!(deleting.on(Confirmed).unwrap(), Removed);
    }

    #[test]
    fn create_is_confirmed_or_discarded() {
        assert_eq!(PendingCreate.on(Confirmed).unwrap(), Persisted);
        assert_eq!(PendingCreate.on(Failed).unwrap(), Discarded);
    }

    #[test]
    fn overlapping_mutation_is_rejected() {
        let err = Toggling.on(BeginDelete).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert!(Removed.on(BeginToggle).is_err());
        assert!(Persisted.on(Confirmed).is_err());
    }
}
