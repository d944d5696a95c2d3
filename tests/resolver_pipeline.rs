use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use refpin::image::ImageReference;
use refpin::registry::{Anonymous, RemoteOptions, Transport};
use refpin::{DigestCache, ReferenceResolver, Resolution, ResolveConfig, Result};

/// Transport with a fixed answer, an artificial delay to widen race windows
/// and a call counter.
struct CountingTransport {
    digest: String,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingTransport {
    fn new(digest: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            digest: digest.to_string(),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn get_digest(
        &self,
        _reference: &ImageReference,
        _options: &RemoteOptions,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.digest.clone())
    }
}

fn resolver(transport: Arc<CountingTransport>) -> ReferenceResolver {
    let mut resolver = ReferenceResolver::with_transport(transport);
    resolver.set_credentials(Arc::new(Anonymous));
    resolver
}

#[tokio::test]
async fn test_concurrent_resolves_converge_on_one_cached_digest() {
    const WORKERS: usize = 16;

    let transport = CountingTransport::new("sha256:abc", Duration::from_millis(10));
    let cache = DigestCache::new();
    let mut r = resolver(transport.clone());
    r.set_cache(cache.clone());
    let r = Arc::new(r);

    let mut handles = Vec::new();
    for _ in 0..WORKERS {
        let r = Arc::clone(&r);
        handles.push(tokio::spawn(async move {
            r.resolve("FROM nginx:1.21", &ResolveConfig::new())
                .await
                .unwrap()
        }));
    }

    let mut digests = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Resolution::Resolved(entity) => digests.push(entity.digest),
            Resolution::Skipped(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    // Racing misses may each fetch, but never more than one fetch per worker,
    // and everyone must agree on the digest.
    let calls = transport.calls();
    assert!(calls >= 1 && calls <= WORKERS, "got {} calls", calls);
    assert!(digests.iter().all(|digest| digest == "sha256:abc"));
    assert_eq!(cache.len(), 1);

    // The cache is warm now; further resolves are free.
    r.resolve("FROM nginx:1.21", &ResolveConfig::new())
        .await
        .unwrap();
    assert_eq!(transport.calls(), calls);
}

#[tokio::test]
async fn test_shared_cache_spans_resolvers() {
    let transport = CountingTransport::new("sha256:abc", Duration::ZERO);
    let cache = DigestCache::new();

    let mut first = resolver(transport.clone());
    first.set_cache(cache.clone());
    first
        .resolve("image: redis:7", &ResolveConfig::new())
        .await
        .unwrap();

    let mut second = resolver(transport.clone());
    second.set_cache(cache.clone());
    second
        .resolve("image: redis:7", &ResolveConfig::new())
        .await
        .unwrap();

    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_prefix_round_trip_reconstruction() {
    let transport = CountingTransport::new("sha256:abc", Duration::ZERO);
    let r = resolver(transport);

    for (matched, expected_prefix) in [
        ("FROM golang:1.22", "FROM "),
        ("image: golang:1.22", "image: "),
        ("golang:1.22", ""),
    ] {
        let entity = match r.resolve(matched, &ResolveConfig::new()).await.unwrap() {
            Resolution::Resolved(entity) => entity,
            Resolution::Skipped(reason) => panic!("unexpected skip: {}", reason),
        };
        assert_eq!(entity.prefix, expected_prefix);

        let rewritten = format!("{}{}@{}", entity.prefix, entity.name, entity.digest);
        assert!(rewritten.starts_with(expected_prefix));
        assert!(rewritten.ends_with("index.docker.io/library/golang@sha256:abc"));
    }
}
