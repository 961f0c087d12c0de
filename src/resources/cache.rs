use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tokio::sync::Semaphore;

use crate::{
    config::CacheOpts,
    foundation::error::{BoardError, BoardResult, LoadError},
    resources::{
        decode::{DecodedImage, SizeHint, decode_image},
        fetch::Fetch,
    },
};

/// Cache key: locator plus optional decode size hint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub locator: String,
    pub hint: Option<SizeHint>,
}

impl CacheKey {
    pub fn new(locator: impl Into<String>, hint: Option<SizeHint>) -> Self {
        Self {
            locator: locator.into(),
            hint,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hint {
            Some(h) => write!(f, "{}@{}x{}", self.locator, h.width, h.height),
            None => f.write_str(&self.locator),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Requests that attached to a load already in flight.
    pub joins: u64,
    pub misses: u64,
    /// Underlying fetches actually issued.
    pub fetches: u64,
    pub evictions: u64,
    pub items: usize,
    pub pixels: u64,
    pub in_flight: usize,
}

type LoadOutput = Result<Arc<DecodedImage>, LoadError>;
type LoadFuture = Shared<BoxFuture<'static, LoadOutput>>;

/// Deduplicating, concurrency-limited image loader with LRU and pixel-budget eviction.
///
/// Cloning is cheap; clones share the same cache. Loads need a tokio runtime because decoding
/// runs on the blocking pool.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn Fetch>,
    opts: CacheOpts,
    permits: Arc<Semaphore>,
    state: Mutex<State>,
}

struct State {
    lru: LruCache<CacheKey, Arc<DecodedImage>>,
    total_pixels: u64,
    in_flight: HashMap<CacheKey, InFlight>,
    next_load_id: u64,
    stats: CacheStats,
}

struct InFlight {
    id: u64,
    future: LoadFuture,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("opts", &self.inner.opts)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ImageCache {
    pub fn new(fetcher: impl Fetch, opts: CacheOpts) -> Self {
        Self::with_shared_fetcher(Arc::new(fetcher), opts)
    }

    pub fn with_shared_fetcher(fetcher: Arc<dyn Fetch>, opts: CacheOpts) -> Self {
        let permits = Arc::new(Semaphore::new(opts.max_concurrent.max(1)));
        Self {
            inner: Arc::new(Inner {
                fetcher,
                opts,
                permits,
                state: Mutex::new(State {
                    lru: LruCache::unbounded(),
                    total_pixels: 0,
                    in_flight: HashMap::new(),
                    next_load_id: 0,
                    stats: CacheStats::default(),
                }),
            }),
        }
    }

    pub fn opts(&self) -> &CacheOpts {
        &self.inner.opts
    }

    /// Load and decode `locator`, sharing any identical in-flight request.
    ///
    /// The request is registered immediately; the returned future only waits on it.
    pub fn load(
        &self,
        locator: &str,
        hint: Option<SizeHint>,
    ) -> BoxFuture<'static, BoardResult<Arc<DecodedImage>>> {
        let key = CacheKey::new(locator, hint);
        let shared = {
            let mut st = self.inner.lock();
            if let Some(img) = st.lru.get(&key).cloned() {
                st.stats.hits += 1;
                tracing::debug!(key = %key, "image cache hit");
                return async move { Ok(img) }.boxed();
            }
            if let Some(pending) = st.in_flight.get(&key) {
                let future = pending.future.clone();
                st.stats.joins += 1;
                tracing::debug!(key = %key, "joined in-flight image load");
                future
            } else {
                st.stats.misses += 1;
                let id = st.next_load_id;
                st.next_load_id += 1;
                let future = run_load(self.inner.clone(), key.clone(), id)
                    .boxed()
                    .shared();
                st.in_flight.insert(
                    key,
                    InFlight {
                        id,
                        future: future.clone(),
                    },
                );
                future
            }
        };
        async move { shared.await.map_err(BoardError::from) }.boxed()
    }

    /// Cached bitmap for the key without touching recency.
    pub fn peek(&self, locator: &str, hint: Option<SizeHint>) -> Option<Arc<DecodedImage>> {
        let key = CacheKey::new(locator, hint);
        self.inner.lock().lru.peek(&key).cloned()
    }

    pub fn contains(&self, locator: &str, hint: Option<SizeHint>) -> bool {
        self.peek(locator, hint).is_some()
    }

    /// Evict everything. Loads still in flight detach and land in the emptied cache.
    pub fn clear(&self) {
        let mut st = self.inner.lock();
        let dropped = st.lru.len();
        st.lru.clear();
        st.total_pixels = 0;
        st.in_flight.clear();
        tracing::debug!(dropped, "image cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let st = self.inner.lock();
        CacheStats {
            items: st.lru.len(),
            pixels: st.total_pixels,
            in_flight: st.in_flight.len(),
            ..st.stats
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn insert(&mut self, key: CacheKey, img: Arc<DecodedImage>, opts: &CacheOpts) {
        let px = img.pixel_count();
        if let Some(old) = self.lru.put(key, img) {
            self.total_pixels = self.total_pixels.saturating_sub(old.pixel_count());
        }
        self.total_pixels += px;

        while self.lru.len() > opts.max_items || self.total_pixels > opts.max_pixels {
            let Some((evicted, bitmap)) = self.lru.pop_lru() else {
                break;
            };
            self.total_pixels = self.total_pixels.saturating_sub(bitmap.pixel_count());
            self.stats.evictions += 1;
            tracing::debug!(key = %evicted, pixels = bitmap.pixel_count(), "image evicted");
        }
    }
}

#[tracing::instrument(skip(inner, key), fields(key = %key))]
async fn run_load(inner: Arc<Inner>, key: CacheKey, id: u64) -> LoadOutput {
    let result = fetch_and_decode(&inner, &key).await;

    let mut st = inner.lock();
    if st.in_flight.get(&key).is_some_and(|p| p.id == id) {
        st.in_flight.remove(&key);
    }
    match result {
        Ok(img) => {
            st.insert(key, img.clone(), &inner.opts);
            Ok(img)
        }
        Err(err) => {
            tracing::warn!(error = %err, "image load failed");
            Err(err)
        }
    }
}

async fn fetch_and_decode(inner: &Inner, key: &CacheKey) -> LoadOutput {
    let _permit = inner
        .permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| LoadError::fetch(&key.locator, e))?;

    inner.lock().stats.fetches += 1;
    let bytes = inner.fetcher.fetch(&key.locator).await?;

    let locator = key.locator.clone();
    let hint = key.hint;
    let max_dim = inner.opts.max_decode_dim;
    let decoded =
        tokio::task::spawn_blocking(move || decode_image(&locator, &bytes, hint, max_dim))
            .await
            .map_err(|e| LoadError::decode(&key.locator, e))??;
    Ok(Arc::new(decoded))
}
