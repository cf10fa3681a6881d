use shared_models::appointment::FormattedAppointment;
use shared_models::calendar::ProviderId;

use crate::models::ColumnProvider;

pub const PLACEHOLDER_PROVIDER_ID: ProviderId = 0;
pub const PLACEHOLDER_PROVIDER_NAME: &str = "All Providers";
const UNKNOWN_PROVIDER_NAME: &str = "Unknown Provider";

/// Providers in order of first appearance, each with its own appointments.
/// With no appointments at all a single "All Providers" column is returned.
pub fn group_by_provider(events: &[FormattedAppointment]) -> Vec<(ColumnProvider, Vec<FormattedAppointment>)> {
    let mut columns: Vec<(ColumnProvider, Vec<FormattedAppointment>)> = Vec::new();

    for event in events {
        match columns.iter_mut().find(|(provider, _)| provider.id == event.provider_id) {
            Some((_, appointments)) => appointments.push(event.clone()),
            None => columns.push((
                ColumnProvider {
                    id: event.provider_id,
                    name: event
                        .provider_name
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_PROVIDER_NAME.to_string()),
                },
                vec![event.clone()],
            )),
        }
    }

    if columns.is_empty() {
        columns.push((
            ColumnProvider {
                id: PLACEHOLDER_PROVIDER_ID,
                name: PLACEHOLDER_PROVIDER_NAME.to_string(),
            },
            Vec::new(),
        ));
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::appointment;

    #[test]
    fn groups_in_first_seen_order() {
        let mut nameless = appointment(4, 9, "2026-02-26 12:00", "2026-02-26 12:30");
        nameless.provider_name = None;

        let events = vec![
            appointment(1, 2, "2026-02-26 09:00", "2026-02-26 09:30"),
            appointment(2, 1, "2026-02-26 09:00", "2026-02-26 09:30"),
            appointment(3, 2, "2026-02-26 10:00", "2026-02-26 10:30"),
            nameless,
        ];

        let columns = group_by_provider(&events);
        let ids: Vec<ProviderId> = columns.iter().map(|(p, _)| p.id).collect();
        assert_eq!(ids, vec![2, 1, 9]);
        assert_eq!(columns[0].1.len(), 2);
        assert_eq!(columns[0].0.name, "Provider 2");
        assert_eq!(columns[2].0.name, "Unknown Provider");
    }

    #[test]
    fn empty_day_gets_placeholder_column() {
        let columns = group_by_provider(&[]);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].0.id, 0);
        assert_eq!(columns[0].0.name, "All Providers");
    }
}
