//! Integration tests for the telemetry caches under concurrent use.

use std::sync::Arc;

use async_trait::async_trait;
use llm_telemetry_cache::{CacheError, CorrelationCache, TokenCache, TokenGenerator};

struct SlowGenerator {
    token: String,
}

#[async_trait]
impl TokenGenerator for SlowGenerator {
    async fn exchange_token(&self, _scopes: &[String]) -> anyhow::Result<String> {
        // Simulate a network round-trip; must not serialize other principals.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Ok(self.token.clone())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fetches_for_different_principals() {
    let cache = Arc::new(TokenCache::new());
    for i in 0..8 {
        cache
            .register(
                &format!("agent-{}", i),
                "tenant-1",
                Arc::new(SlowGenerator {
                    token: format!("tok-{}", i),
                }),
                vec!["telemetry.write".to_string()],
            )
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            cache.get_token(&format!("agent-{}", i), "tenant-1").await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let token = handle.await.unwrap().unwrap();
        assert_eq!(token, format!("tok-{}", i));
    }
}

#[tokio::test]
async fn test_caller_timeout_is_propagated_as_failure() {
    struct HangingGenerator;

    #[async_trait]
    impl TokenGenerator for HangingGenerator {
        async fn exchange_token(&self, _scopes: &[String]) -> anyhow::Result<String> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok("never".to_string())
        }
    }

    let cache = TokenCache::new();
    cache
        .register("agent-1", "tenant-1", Arc::new(HangingGenerator), vec![])
        .unwrap();

    let result = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        cache.get_token("agent-1", "tenant-1"),
    )
    .await;

    // The caller's timeout fires; the cache has not swallowed the delay.
    assert!(result.is_err());
}

#[test]
fn test_correlation_cache_concurrent_inserts_stay_bounded() {
    let cache = Arc::new(CorrelationCache::with_capacity(64));
    let mut handles = Vec::new();

    for t in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(std::thread::spawn(move || {
            for i in 0..256 {
                cache.record(
                    &format!("fn_{}_{}", t, i),
                    r#"{"arg":1}"#,
                    &format!("call_{}_{}", t, i),
                );
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.len() <= 64);
}

#[test]
fn test_validation_and_lookup_errors_are_distinct() {
    let cache = TokenCache::new();
    let validation = cache
        .register(" ", "tenant", Arc::new(SlowGenerator { token: "t".into() }), vec![])
        .unwrap_err();
    assert!(validation.is_validation());
    assert!(matches!(validation, CacheError::BlankArgument { .. }));
}
