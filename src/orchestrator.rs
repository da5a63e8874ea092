//! # Fetch/Cache Orchestrator
//! Decides when to call a tool, keys and expires cached results, and exposes
//! loading / error / data state for one `(tool, args)` binding.
//!
//! State machine: `Idle → Loading → {Ready | Error}`, re-entered on every
//! [`DataBinding::request`] and whenever [`DataBinding::rebind`] changes the key.
//!
//! Each request takes a generation number. A completion whose generation is no
//! longer the latest is dropped: it neither writes the cache nor publishes, so
//! an older response can never overwrite a newer one. The dropped caller waits
//! for the latest request to settle and returns that state, so an awaited
//! request never comes back still loading.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;

use crate::cache::{cache_key, CacheEntry, ToolCache};
use crate::clock::{Clock, SystemClock};
use crate::tool::{self, ToolArgs, ToolClient, ToolError};

/// Default maximum age of a cache entry that is served without a tool call.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Pure text → data function run over every fetched response.
pub type Extractor<T> = fn(&str) -> T;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// What a caller sees for a binding. `data` survives a failed refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub raw_text: Option<String>,
    pub loading: bool,
    pub error: Option<ToolError>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            raw_text: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if self.data.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }
}

/// Shared wiring: tool client, cache, clock and freshness window.
#[derive(Clone)]
pub struct Orchestrator {
    client: Arc<dyn ToolClient>,
    cache: ToolCache,
    clock: Arc<dyn Clock>,
    freshness: Duration,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn ToolClient>, cache: ToolCache) -> Self {
        crate::metrics::ensure_described();
        Self {
            client,
            cache,
            clock: Arc::new(SystemClock),
            freshness: FRESHNESS_WINDOW,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    pub fn cache(&self) -> &ToolCache {
        &self.cache
    }

    pub fn bind<T>(&self, tool: &str, args: ToolArgs, extractor: Extractor<T>) -> DataBinding<T> {
        DataBinding {
            orch: self.clone(),
            extractor,
            target: Mutex::new(Target {
                tool: tool.to_string(),
                args,
            }),
            state: Mutex::new(FetchState::default()),
            generation: AtomicU64::new(0),
            settled: watch::Sender::new(0),
        }
    }

    /// Uncached one-shot claim of all coupons.
    pub async fn auto_bind(&self) -> Result<String, ToolError> {
        let out = tool::auto_bind_coupons(self.client.as_ref()).await;
        if let Err(e) = &out {
            counter!("tool_errors_total").increment(1);
            tracing::warn!(target: "orchestrator", kind = e.kind(), error = %e, "auto-bind failed");
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Target {
    tool: String,
    args: ToolArgs,
}

/// One data binding: a tool, its arguments, an extractor and the published state.
pub struct DataBinding<T> {
    orch: Orchestrator,
    extractor: Extractor<T>,
    target: Mutex<Target>,
    state: Mutex<FetchState<T>>,
    generation: AtomicU64,
    /// Last generation that settled; callers superseded mid-flight wait on it.
    settled: watch::Sender<u64>,
}

impl<T> DataBinding<T>
where
    T: Clone + Serialize + DeserializeOwned + Send,
{
    pub fn snapshot(&self) -> FetchState<T> {
        self.state.lock().expect("binding state poisoned").clone()
    }

    pub fn key(&self) -> String {
        let t = self.target.lock().expect("binding target poisoned");
        cache_key(&t.tool, &t.args)
    }

    /// Serve from cache when fresh (unless forced), otherwise invoke, extract,
    /// write through and publish. Failures keep the cache and prior data.
    ///
    /// Returns once the latest request on this binding has settled, so the
    /// result never has `loading` set.
    pub async fn request(&self, force_refresh: bool) -> FetchState<T> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut in_flight = InFlight {
            binding: self,
            generation,
            armed: true,
        };
        let target = self.target.lock().expect("binding target poisoned").clone();
        let key = cache_key(&target.tool, &target.args);

        {
            let mut st = self.state.lock().expect("binding state poisoned");
            st.loading = true;
            st.error = None;
        }

        let applied = self.fetch(generation, &key, &target, force_refresh).await;
        in_flight.armed = false;

        if !applied {
            counter!("tool_stale_discards_total").increment(1);
            tracing::debug!(target: "orchestrator", %key, generation, "stale completion discarded");
        }
        self.latest_settled().await
    }

    /// Same as `request(true)`.
    pub async fn refresh(&self) -> FetchState<T> {
        self.request(true).await
    }

    /// Point the binding at a different tool/args. An identical target is a
    /// no-op (`None`); a new one clears published state and requests anew.
    pub async fn rebind(&self, tool: &str, args: ToolArgs) -> Option<FetchState<T>> {
        let next = Target {
            tool: tool.to_string(),
            args,
        };
        {
            let mut t = self.target.lock().expect("binding target poisoned");
            if *t == next {
                return None;
            }
            *t = next;
        }
        // Orphan any request still in flight for the old key.
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().expect("binding state poisoned") = FetchState::default();
        Some(self.request(false).await)
    }

    /// Cache lookup or tool call for one generation. Returns whether the
    /// outcome was published.
    async fn fetch(&self, generation: u64, key: &str, target: &Target, force_refresh: bool) -> bool {
        if !force_refresh {
            if let Some(entry) = self.orch.cache.get::<T>(key) {
                if entry.is_fresh(self.orch.clock.now_millis(), self.orch.freshness) {
                    counter!("tool_cache_hits_total").increment(1);
                    tracing::debug!(target: "orchestrator", key, "cache hit");
                    return self.settle(generation, |st| {
                        st.data = Some(entry.data);
                        st.raw_text = Some(entry.raw_text);
                    });
                }
                tracing::debug!(target: "orchestrator", key, "cache entry expired");
            }
            counter!("tool_cache_misses_total").increment(1);
        }

        counter!("tool_invocations_total").increment(1);
        tracing::debug!(target: "orchestrator", key, force_refresh, generation, "invoking tool");
        match self.orch.client.invoke(&target.tool, &target.args).await {
            Ok(resp) => {
                let raw_text = resp.joined_text();
                let data = (self.extractor)(&raw_text);
                counter!("extract_runs_total").increment(1);
                let timestamp = self.orch.clock.now_millis();
                self.settle(generation, |st| {
                    self.orch.cache.set(
                        key,
                        &CacheEntry {
                            data: data.clone(),
                            raw_text: raw_text.clone(),
                            timestamp,
                        },
                    );
                    st.data = Some(data);
                    st.raw_text = Some(raw_text);
                })
            }
            Err(e) => {
                counter!("tool_errors_total").increment(1);
                tracing::warn!(target: "orchestrator", key, kind = e.kind(), error = %e, "tool call failed");
                self.settle(generation, |st| st.error = Some(e))
            }
        }
    }

    /// Published state once the newest generation has settled.
    async fn latest_settled(&self) -> FetchState<T> {
        let mut settled = self.settled.subscribe();
        loop {
            {
                let st = self.state.lock().expect("binding state poisoned");
                if *settled.borrow_and_update() == self.generation.load(Ordering::SeqCst) {
                    return st.clone();
                }
            }
            // The sender lives in `self`, so this only errors if `self` is gone.
            if settled.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }
}

impl<T> DataBinding<T> {
    /// Apply `publish` and end loading, but only if `generation` is still the
    /// latest request. The check and the write happen under the state lock.
    fn settle(&self, generation: u64, publish: impl FnOnce(&mut FetchState<T>)) -> bool {
        let mut st = self.state.lock().expect("binding state poisoned");
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        publish(&mut st);
        st.loading = false;
        self.settled.send_replace(generation);
        true
    }
}

/// Settles a request whose future is dropped before it completes, so callers
/// waiting on it are released and `loading` does not stick.
struct InFlight<'a, T> {
    binding: &'a DataBinding<T>,
    generation: u64,
    armed: bool,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.armed && self.binding.settle(self.generation, |_| {}) {
            tracing::debug!(target: "orchestrator", generation = self.generation, "request dropped before completion");
        }
    }
}
