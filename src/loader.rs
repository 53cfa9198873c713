use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt as _, Shared};

use crate::bundle::{BurgerDataBundle, build_bundle};
use crate::formats::{BurgerContextFile, BurgerDataFile, TvmazePayload};
use crate::source::{
    BURGER_DATA_PATH, CONTEXT_DATA_PATH, DataSource, FetchError, TVMAZE_DATA_PATH, fetch_json,
};

pub type LoadResult = Result<Arc<BurgerDataBundle>, FetchError>;

type PendingLoad = Shared<BoxFuture<'static, LoadResult>>;

enum LoadState {
    Empty,
    Loading(PendingLoad),
    Ready(Arc<BurgerDataBundle>),
}

/// Process-wide accessor for the data bundle.
///
/// The first [`load`](Self::load) starts one build attempt; callers arriving
/// while it runs share its outcome. A successful bundle is kept for the
/// lifetime of the loader. A failed attempt is reported to everyone waiting on
/// it and then forgotten, so the next call starts over.
#[derive(Clone)]
pub struct BurgerDataLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    source: Arc<dyn DataSource>,
    state: Mutex<LoadState>,
}

impl std::fmt::Debug for BurgerDataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.inner.lock_state() {
            LoadState::Empty => "empty",
            LoadState::Loading(_) => "loading",
            LoadState::Ready(_) => "ready",
        };
        f.debug_struct("BurgerDataLoader")
            .field("state", &state)
            .finish_non_exhaustive()
    }
}

impl BurgerDataLoader {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                source,
                state: Mutex::new(LoadState::Empty),
            }),
        }
    }

    /// The bundle, if a build has already succeeded.
    pub fn cached(&self) -> Option<Arc<BurgerDataBundle>> {
        match &*self.inner.lock_state() {
            LoadState::Ready(bundle) => Some(Arc::clone(bundle)),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(&*self.inner.lock_state(), LoadState::Loading(_))
    }

    pub async fn load(&self) -> LoadResult {
        let pending = {
            let mut state = self.inner.lock_state();
            match &*state {
                LoadState::Ready(bundle) => return Ok(Arc::clone(bundle)),
                LoadState::Loading(pending) => {
                    tracing::debug!("joining in-flight data load");
                    pending.clone()
                }
                LoadState::Empty => {
                    tracing::debug!("starting data load");
                    let source = Arc::clone(&self.inner.source);
                    let pending = run_attempt(source, Arc::downgrade(&self.inner))
                        .boxed()
                        .shared();
                    *state = LoadState::Loading(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }
}

impl LoaderInner {
    fn lock_state(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Runs exactly once per attempt, whichever waiter drives it to completion.
// Holds the loader weakly: the pending attempt lives in the loader's state.
async fn run_attempt(source: Arc<dyn DataSource>, loader: Weak<LoaderInner>) -> LoadResult {
    let result = load_bundle(source.as_ref()).await.map(Arc::new);

    let Some(inner) = loader.upgrade() else {
        return result;
    };
    let mut state = inner.lock_state();
    match &result {
        Ok(bundle) => {
            tracing::info!(
                records = bundle.record_count(),
                episodes = bundle.episode_count(),
                context = bundle.context_file.is_some(),
                "burger data ready"
            );
            *state = LoadState::Ready(Arc::clone(bundle));
        }
        Err(err) => {
            tracing::error!(%err, "burger data load failed");
            *state = LoadState::Empty;
        }
    }
    result
}

/// Fetches the documents concurrently and derives a fresh bundle, bypassing
/// any caching.
pub async fn load_bundle(source: &dyn DataSource) -> Result<BurgerDataBundle, FetchError> {
    let (burger_file, tvmaze_file, context_file) = tokio::join!(
        fetch_json::<BurgerDataFile>(source, BURGER_DATA_PATH),
        fetch_json::<TvmazePayload>(source, TVMAZE_DATA_PATH),
        fetch_context(source),
    );

    Ok(build_bundle(burger_file?, tvmaze_file?, context_file))
}

async fn fetch_context(source: &dyn DataSource) -> Option<BurgerContextFile> {
    match fetch_json::<BurgerContextFile>(source, CONTEXT_DATA_PATH).await {
        Ok(file) => Some(file),
        Err(err) if err.is_not_found() => {
            tracing::debug!("no burger context document");
            None
        }
        Err(err) => {
            tracing::warn!(%err, "ignoring unreadable burger context document");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;

    const BURGERS: &str = r#"{
        "source_url": "https://example.test/botd",
        "scraped_at": "2024-01-01T00:00:00Z",
        "records": [
            {"season": 1, "episode_title": "Human Flesh", "burger_of_the_day": "New Bacon-ings",
             "tvmaze_episode_id": 10, "tvmaze_episode_number": 1, "tvmaze_match_type": "exact"},
            {"season": 1, "episode_title": "Crawl Space", "burger_of_the_day": "Child Molester",
             "tvmaze_match_type": "missing"}
        ]
    }"#;

    const EPISODES: &str = r#"{
        "show_query": "Bob's Burgers",
        "retrieved_at": "2024-01-01T00:00:00Z",
        "show": {"id": 107},
        "episodes": [
            {"id": 11, "name": "Crawl Space", "season": 1, "number": 2},
            {"id": 10, "name": "Human Flesh", "season": 1, "number": 1}
        ]
    }"#;

    const CONTEXT: &str = r#"{
        "source_url": "https://example.test/context",
        "scraped_at": "2024-01-01T00:00:00Z",
        "records": [
            {"season": 1, "episode_title": "Human Flesh", "burger_of_the_day": "new bacon-ings",
             "notes": ["First burger of the day."]}
        ]
    }"#;

    #[derive(Default)]
    struct MockSource {
        responses: Mutex<HashMap<String, Result<Vec<u8>, FetchError>>>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl MockSource {
        fn with_defaults() -> Self {
            let source = Self::default();
            source.set_ok(BURGER_DATA_PATH, BURGERS);
            source.set_ok(TVMAZE_DATA_PATH, EPISODES);
            source.set_err(CONTEXT_DATA_PATH, 404);
            source
        }

        fn set_ok(&self, path: &str, body: &str) {
            self.responses
                .lock()
                .unwrap()
                .insert(path.to_owned(), Ok(body.as_bytes().to_vec()));
        }

        fn set_err(&self, path: &str, status: u16) {
            self.responses.lock().unwrap().insert(
                path.to_owned(),
                Err(FetchError::Status {
                    url: path.to_owned(),
                    status,
                }),
            );
        }

        fn calls(&self, path: &str) -> usize {
            self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl DataSource for MockSource {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
            *self.calls.lock().unwrap().entry(path.to_owned()).or_insert(0) += 1;
            // Stay pending once so concurrent callers overlap.
            tokio::task::yield_now().await;
            self.responses
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_else(|| {
                    Err(FetchError::Missing {
                        url: path.to_owned(),
                    })
                })
        }

        fn describe(&self, path: &str) -> String {
            format!("mock://{path}")
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_build() {
        let source = Arc::new(MockSource::with_defaults());
        let loader = BurgerDataLoader::new(source.clone());

        let results = futures::future::join_all((0..5).map(|_| loader.load())).await;
        let bundles = results
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(bundles.iter().all(|b| Arc::ptr_eq(b, &bundles[0])));
        assert_eq!(source.calls(BURGER_DATA_PATH), 1);
        assert_eq!(source.calls(TVMAZE_DATA_PATH), 1);
        assert_eq!(source.calls(CONTEXT_DATA_PATH), 1);

        let again = loader.load().await.unwrap();
        assert!(Arc::ptr_eq(&again, &bundles[0]));
        assert!(Arc::ptr_eq(&loader.cached().unwrap(), &bundles[0]));
        assert_eq!(source.calls(BURGER_DATA_PATH), 1);
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn dropping_every_handle_mid_load_frees_the_loader() {
        let source = Arc::new(MockSource::with_defaults());
        let loader = BurgerDataLoader::new(source.clone());
        let inner = Arc::downgrade(&loader.inner);

        {
            let mut pending = Box::pin(loader.load());
            assert!(futures::poll!(pending.as_mut()).is_pending());
            assert!(loader.is_loading());
        }
        drop(loader);

        assert!(inner.upgrade().is_none());
        assert_eq!(Arc::strong_count(&source), 1);
    }

    #[tokio::test]
    async fn spawned_callers_share_one_build() {
        let source = Arc::new(MockSource::with_defaults());
        let loader = BurgerDataLoader::new(source.clone());

        let handles = (0..4)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load().await })
            })
            .collect::<Vec<_>>();
        let mut bundles = Vec::new();
        for handle in handles {
            bundles.push(handle.await.unwrap().unwrap());
        }

        assert!(bundles.iter().all(|b| Arc::ptr_eq(b, &bundles[0])));
        assert_eq!(source.calls(BURGER_DATA_PATH), 1);
    }

    #[tokio::test]
    async fn missing_context_still_builds() {
        let source = Arc::new(MockSource::with_defaults());
        let loader = BurgerDataLoader::new(source);

        let bundle = loader.load().await.unwrap();
        assert!(bundle.context_file.is_none());
        assert_eq!(bundle.record_count(), 2);
        assert!(bundle.records.iter().all(|r| r.reference_notes.is_none()));
        assert_eq!(
            bundle
                .episodes
                .iter()
                .map(|e| e.code.as_str())
                .collect::<Vec<_>>(),
            vec!["s01e01", "s01e02"]
        );
    }

    #[tokio::test]
    async fn context_notes_are_attached_when_present() {
        let source = Arc::new(MockSource::with_defaults());
        source.set_ok(CONTEXT_DATA_PATH, CONTEXT);
        let loader = BurgerDataLoader::new(source);

        let bundle = loader.load().await.unwrap();
        assert_eq!(
            bundle.records[0].reference_notes,
            Some(vec!["First burger of the day.".to_owned()])
        );
        assert_eq!(bundle.records[1].reference_notes, None);
    }

    #[tokio::test]
    async fn broken_context_degrades_to_absent() {
        let source = Arc::new(MockSource::with_defaults());
        source.set_ok(CONTEXT_DATA_PATH, "{ nope");
        let bundle = BurgerDataLoader::new(source.clone()).load().await.unwrap();
        assert!(bundle.context_file.is_none());

        source.set_err(CONTEXT_DATA_PATH, 503);
        let bundle = BurgerDataLoader::new(source).load().await.unwrap();
        assert!(bundle.context_file.is_none());
    }

    #[tokio::test]
    async fn required_failure_is_shared_then_retried() {
        let source = Arc::new(MockSource::with_defaults());
        source.set_err(TVMAZE_DATA_PATH, 500);
        let loader = BurgerDataLoader::new(source.clone());

        let (first, second) = tokio::join!(loader.load(), loader.load());
        let first = first.unwrap_err();
        assert_eq!(
            first,
            FetchError::Status {
                url: TVMAZE_DATA_PATH.to_owned(),
                status: 500
            }
        );
        assert_eq!(second.unwrap_err(), first);
        assert_eq!(source.calls(TVMAZE_DATA_PATH), 1);
        assert!(loader.cached().is_none());
        assert!(!loader.is_loading());

        source.set_ok(TVMAZE_DATA_PATH, EPISODES);
        let bundle = loader.load().await.unwrap();
        assert_eq!(bundle.episode_count(), 2);
        assert_eq!(source.calls(TVMAZE_DATA_PATH), 2);
        assert_eq!(source.calls(BURGER_DATA_PATH), 2);
    }

    #[tokio::test]
    async fn malformed_required_document_fails_the_build() {
        let source = Arc::new(MockSource::with_defaults());
        source.set_ok(BURGER_DATA_PATH, r#"{"records": [{"season": "one"}]}"#);
        let loader = BurgerDataLoader::new(source);

        let err = loader.load().await.unwrap_err();
        match err {
            FetchError::Parse { url, .. } => {
                assert_eq!(url, "mock://data/burger-of-the-day.json")
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(loader.cached().is_none());
    }
}
