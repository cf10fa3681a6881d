use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use shared_database::ProviderScheduleSource;
use shared_models::calendar::{ProviderId, ProviderSchedule};

use crate::models::AvailabilityError;

type ScheduleFetch = Shared<BoxFuture<'static, Result<Option<ProviderSchedule>, String>>>;

enum Entry {
    Ready(Option<ProviderSchedule>),
    InFlight { fetch: ScheduleFetch, generation: u64 },
    Failed,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<ProviderId, Entry>,
    next_generation: u64,
}

/// Result of resolving several providers at once. Providers whose schedule
/// could not be loaded are listed in `failed` and carry a closed schedule.
#[derive(Debug, Clone, Default)]
pub struct ScheduleLookup {
    pub schedules: HashMap<ProviderId, ProviderSchedule>,
    pub failed: Vec<ProviderId>,
}

/// Request-coalescing cache in front of the provider schedule source.
///
/// At most one fetch per provider is in flight; concurrent callers share its
/// outcome. A fetch is retried once, after which the provider is marked failed
/// until [`invalidate`](Self::invalidate) resets it. Entries live for the
/// lifetime of the process.
pub struct ProviderScheduleCache {
    source: Arc<dyn ProviderScheduleSource>,
    state: Mutex<CacheState>,
}

impl ProviderScheduleCache {
    pub fn new(source: Arc<dyn ProviderScheduleSource>) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState::default()),
        }
    }

    fn start_fetch(&self, provider_id: ProviderId) -> ScheduleFetch {
        let source = Arc::clone(&self.source);
        async move {
            match source.load_provider_schedule(provider_id).await {
                Ok(schedule) => Ok(schedule),
                Err(first) => {
                    warn!("Schedule fetch for provider {} failed ({}), retrying once", provider_id, first);
                    source
                        .load_provider_schedule(provider_id)
                        .await
                        .map_err(|e| e.to_string())
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Cached schedule, or the shared outcome of a single fetch.
    pub async fn get(&self, provider_id: ProviderId) -> Result<Option<ProviderSchedule>, AvailabilityError> {
        let (fetch, generation) = {
            let mut state = self.state.lock().await;
            match state.entries.get(&provider_id) {
                Some(Entry::Ready(schedule)) => return Ok(schedule.clone()),
                Some(Entry::Failed) => return Err(AvailabilityError::ScheduleFailed(provider_id)),
                Some(Entry::InFlight { fetch, generation }) => {
                    debug!("Joining in-flight schedule fetch for provider {}", provider_id);
                    (fetch.clone(), *generation)
                }
                None => {
                    let generation = state.next_generation;
                    state.next_generation += 1;
                    let fetch = self.start_fetch(provider_id);
                    state.entries.insert(
                        provider_id,
                        Entry::InFlight {
                            fetch: fetch.clone(),
                            generation,
                        },
                    );
                    (fetch, generation)
                }
            }
        };

        let outcome = fetch.await;

        let mut state = self.state.lock().await;
        let still_current = matches!(
            state.entries.get(&provider_id),
            Some(Entry::InFlight { generation: current, .. }) if *current == generation
        );
        if still_current {
            let entry = match &outcome {
                Ok(schedule) => Entry::Ready(schedule.clone()),
                Err(_) => Entry::Failed,
            };
            state.entries.insert(provider_id, entry);
        }

        outcome.map_err(|message| AvailabilityError::ScheduleFetch { provider_id, message })
    }

    /// Resolve several providers concurrently. Failures never abort the batch.
    pub async fn get_many(&self, provider_ids: &[ProviderId]) -> ScheduleLookup {
        let results = join_all(provider_ids.iter().map(|id| async move { (*id, self.get(*id).await) })).await;

        let mut lookup = ScheduleLookup::default();
        for (provider_id, result) in results {
            match result {
                Ok(Some(schedule)) => {
                    lookup.schedules.insert(provider_id, schedule);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{}", e);
                    lookup.schedules.insert(provider_id, ProviderSchedule::default());
                    lookup.failed.push(provider_id);
                }
            }
        }
        lookup
    }

    pub async fn invalidate(&self, provider_id: ProviderId) {
        debug!("Invalidating cached schedule for provider {}", provider_id);
        self.state.lock().await.entries.remove(&provider_id);
    }

    pub async fn invalidate_all(&self) {
        debug!("Invalidating all cached provider schedules");
        self.state.lock().await.entries.clear();
    }
}
