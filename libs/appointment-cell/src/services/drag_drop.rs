//! Drag-and-drop reschedule session.
//!
//! `Idle -> Dragging -> Confirming -> Committing -> Idle`, with an invalid drop,
//! a declined confirmation or a cancelled drag each returning straight to
//! `Idle`. Nothing is written upstream before `Committing`.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use shared_database::AppointmentCommands;
use shared_models::appointment::{FormattedAppointment, ReschedulePayload};

use crate::models::{DropTarget, RescheduleError, RescheduleProposal};
use crate::services::reschedule::RescheduleValidator;

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { appointment: FormattedAppointment },
    Confirming { proposal: RescheduleProposal },
    Committing { proposal: RescheduleProposal },
}

impl DragState {
    pub fn name(&self) -> &'static str {
        match self {
            DragState::Idle => "idle",
            DragState::Dragging { .. } => "dragging",
            DragState::Confirming { .. } => "confirming",
            DragState::Committing { .. } => "committing",
        }
    }
}

#[derive(Debug)]
pub struct DragDropSession {
    state: DragState,
    validator: RescheduleValidator,
}

impl DragDropSession {
    pub fn new(validator: RescheduleValidator) -> Self {
        Self {
            state: DragState::Idle,
            validator,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    fn invalid(&self, action: &'static str) -> RescheduleError {
        RescheduleError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    pub fn start_drag(&mut self, appointment: FormattedAppointment) -> Result<(), RescheduleError> {
        if self.state != DragState::Idle {
            return Err(self.invalid("start a drag"));
        }
        debug!("Drag started for appointment {}", appointment.id);
        self.state = DragState::Dragging { appointment };
        Ok(())
    }

    /// Abandon the drag or the pending confirmation. A commit in flight cannot be cancelled.
    pub fn cancel(&mut self) -> Result<(), RescheduleError> {
        if matches!(self.state, DragState::Committing { .. }) {
            return Err(self.invalid("cancel"));
        }
        self.state = DragState::Idle;
        Ok(())
    }

    /// Validate the drop. A valid drop waits for confirmation; an invalid one
    /// reverts the session to `Idle` and reports why.
    pub fn drop_on(
        &mut self,
        target: &DropTarget,
        now: NaiveDateTime,
        appointments: &[FormattedAppointment],
    ) -> Result<RescheduleProposal, RescheduleError> {
        let appointment = match &self.state {
            DragState::Dragging { appointment } => appointment,
            _ => return Err(self.invalid("drop")),
        };

        let checked = self.validator.propose(appointment, target).and_then(|proposal| {
            self.validator.validate(&proposal, now, appointments)?;
            Ok(proposal)
        });
        let proposal = match checked {
            Ok(proposal) => proposal,
            Err(e) => {
                self.state = DragState::Idle;
                return Err(e);
            }
        };

        self.state = DragState::Confirming {
            proposal: proposal.clone(),
        };
        Ok(proposal)
    }

    pub fn decline(&mut self) -> Result<(), RescheduleError> {
        if !matches!(self.state, DragState::Confirming { .. }) {
            return Err(self.invalid("decline"));
        }
        self.state = DragState::Idle;
        Ok(())
    }

    pub fn confirm(&mut self) -> Result<(), RescheduleError> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Confirming { proposal } => {
                self.state = DragState::Committing { proposal };
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("confirm"))
            }
        }
    }

    /// Send the confirmed move upstream. The session returns to `Idle` whether
    /// or not the commit succeeds; callers reload authoritative state either way.
    pub async fn commit(&mut self, commands: &dyn AppointmentCommands) -> Result<RescheduleProposal, RescheduleError> {
        let proposal = match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Committing { proposal } => proposal,
            other => {
                self.state = other;
                return Err(self.invalid("commit"));
            }
        };

        let payload = ReschedulePayload::new(proposal.new_start, proposal.new_end);
        match commands.commit_reschedule(proposal.appointment_id, &payload).await {
            Ok(()) => {
                info!(
                    "Appointment {} moved from {} to {}",
                    proposal.appointment_id, proposal.original_start, proposal.new_start
                );
                Ok(proposal)
            }
            Err(e) => {
                warn!("Reschedule of appointment {} rejected: {}", proposal.appointment_id, e);
                Err(RescheduleError::CommitFailed {
                    message: e.to_string(),
                    current: None,
                })
            }
        }
    }
}
