use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use shared_config::CalendarConfig;
use shared_database::{AppointmentCommands, AppointmentFormatter, AppointmentQuery};
use shared_models::appointment::{AppointmentFilters, AppointmentId, AppointmentStatus, FormattedAppointment};
use shared_models::calendar::ProviderId;

use crate::models::{DropTarget, RescheduleError, RescheduleOutcome, RescheduleProposal};
use crate::services::drag_drop::DragDropSession;
use crate::services::reschedule::RescheduleValidator;
use crate::services::status::validate_status_transition;

/// Runs reschedule and status changes against the upstream collaborators.
/// After every commit attempt the appointment is reloaded so callers render
/// the upstream's state, never the optimistic one.
pub struct AppointmentService {
    config: CalendarConfig,
    validator: RescheduleValidator,
    appointments: Arc<dyn AppointmentQuery>,
    formatter: Arc<dyn AppointmentFormatter>,
    commands: Arc<dyn AppointmentCommands>,
}

impl AppointmentService {
    pub fn new(
        config: CalendarConfig,
        appointments: Arc<dyn AppointmentQuery>,
        formatter: Arc<dyn AppointmentFormatter>,
        commands: Arc<dyn AppointmentCommands>,
    ) -> Self {
        Self {
            validator: RescheduleValidator::from_config(&config),
            config,
            appointments,
            formatter,
            commands,
        }
    }

    async fn load(&self, id: AppointmentId) -> Result<FormattedAppointment, RescheduleError> {
        let row = self
            .appointments
            .get_by_id(id)
            .await
            .map_err(|e| RescheduleError::Upstream(e.to_string()))?
            .ok_or(RescheduleError::NotFound(id))?;

        self.formatter
            .format_many_for_calendar(std::slice::from_ref(&row))
            .into_iter()
            .next()
            .ok_or(RescheduleError::NotFound(id))
    }

    /// Best-effort reload after a commit attempt.
    async fn reload(&self, id: AppointmentId) -> Option<FormattedAppointment> {
        match self.load(id).await {
            Ok(appointment) => Some(appointment),
            Err(e) => {
                warn!("Could not reload appointment {}: {}", id, e);
                None
            }
        }
    }

    /// The provider's bookings that can touch `date`. The range starts a day
    /// early because the upstream matches on start date, and a booking that
    /// runs past midnight still occupies the morning.
    async fn provider_day(
        &self,
        provider_id: ProviderId,
        date: NaiveDate,
    ) -> Result<Vec<FormattedAppointment>, RescheduleError> {
        let first = date.pred_opt().unwrap_or(date);
        let rows = self
            .appointments
            .get_for_range(first, date, &AppointmentFilters::for_provider(provider_id))
            .await
            .map_err(|e| RescheduleError::Upstream(e.to_string()))?;
        Ok(self.formatter.format_many_for_calendar(&rows))
    }

    /// Drag and drop up to the confirmation step, leaving the session waiting.
    async fn dropped(
        &self,
        id: AppointmentId,
        target: &DropTarget,
    ) -> Result<(DragDropSession, RescheduleProposal), RescheduleError> {
        let appointment = self.load(id).await?;
        let same_day = self.provider_day(appointment.provider_id, target.date).await?;

        let mut session = DragDropSession::new(self.validator);
        session.start_drag(appointment)?;
        let proposal = session.drop_on(target, self.config.now(), &same_day)?;
        Ok((session, proposal))
    }

    /// Validate a move without committing it.
    pub async fn validate_reschedule(
        &self,
        id: AppointmentId,
        target: &DropTarget,
    ) -> Result<RescheduleProposal, RescheduleError> {
        debug!("Validating reschedule of appointment {} to {:?}", id, target);
        let (mut session, proposal) = self.dropped(id, target).await?;
        session.decline()?;
        Ok(proposal)
    }

    /// Validate, commit, then reload. The request itself is the confirmation.
    pub async fn reschedule(
        &self,
        id: AppointmentId,
        target: &DropTarget,
    ) -> Result<RescheduleOutcome, RescheduleError> {
        debug!("Rescheduling appointment {} to {:?}", id, target);
        let (mut session, _) = self.dropped(id, target).await?;
        session.confirm()?;

        match session.commit(self.commands.as_ref()).await {
            Ok(proposal) => Ok(RescheduleOutcome {
                proposal,
                appointment: self.reload(id).await,
            }),
            Err(RescheduleError::CommitFailed { message, .. }) => Err(RescheduleError::CommitFailed {
                message,
                current: self.reload(id).await.map(Box::new),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn change_status(
        &self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Option<FormattedAppointment>, RescheduleError> {
        let appointment = self.load(id).await?;
        validate_status_transition(appointment.status, status)?;

        if let Err(e) = self.commands.commit_status(id, status).await {
            warn!("Status change of appointment {} rejected: {}", id, e);
            return Err(RescheduleError::CommitFailed {
                message: e.to_string(),
                current: self.reload(id).await.map(Box::new),
            });
        }

        info!("Appointment {} status changed to {:?}", id, status);
        Ok(self.reload(id).await)
    }
}
