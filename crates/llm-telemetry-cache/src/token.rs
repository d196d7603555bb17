//! Per-principal memoization of observability auth token generators.
//!
//! Shipping telemetry to the collector requires a bearer token scoped to the
//! (agent, tenant) pair being observed. Exporters register a token generator
//! once per principal and fetch tokens on demand; the cache guarantees a
//! single stored generator per principal even under racing registrations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CacheError, Result};

/// Source of bearer tokens for telemetry export.
///
/// Implementations are supplied by the host application (typically a thin
/// wrapper over its identity client). `exchange_token` may suspend on network
/// I/O; the cache never invokes it while holding its lock.
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    /// Exchange the generator's credential for a bearer token covering
    /// `scopes`.
    async fn exchange_token(&self, scopes: &[String]) -> anyhow::Result<String>;
}

struct TokenEntry {
    generator: Arc<dyn TokenGenerator>,
    scopes: Vec<String>,
}

impl Clone for TokenEntry {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            scopes: self.scopes.clone(),
        }
    }
}

/// Thread-safe cache of token generators keyed by `agentId:tenantId`.
///
/// The lock guards only map lookup and insertion; token exchange runs outside
/// it, so concurrent fetches for different principals never serialize on each
/// other.
#[derive(Default)]
pub struct TokenCache {
    entries: Mutex<HashMap<String, TokenEntry>>,
}

impl TokenCache {
    /// Create an empty token cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token generator for the (agent, tenant) principal.
    ///
    /// Registration is idempotent: the first generator stored for a key wins
    /// and later registrations for the same key are no-ops (the stored entry
    /// is not refreshed). Blank `agent_id` or `tenant_id` fail validation
    /// before any state is mutated.
    pub fn register(
        &self,
        agent_id: &str,
        tenant_id: &str,
        generator: Arc<dyn TokenGenerator>,
        scopes: Vec<String>,
    ) -> Result<()> {
        if agent_id.trim().is_empty() {
            return Err(CacheError::blank("agent_id"));
        }
        if tenant_id.trim().is_empty() {
            return Err(CacheError::blank("tenant_id"));
        }

        let key = Self::cache_key(agent_id, tenant_id);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(key)
            .or_insert_with(|| {
                debug!(agent_id, tenant_id, "Registered telemetry token generator");
                TokenEntry { generator, scopes }
            });

        Ok(())
    }

    /// Fetch a bearer token for the (agent, tenant) principal.
    ///
    /// Fails with [`CacheError::NotRegistered`] when no generator was
    /// registered for the key, and with [`CacheError::ExchangeFailed`] when
    /// the generator itself errors (including caller-imposed timeouts, which
    /// are propagated, never swallowed).
    pub async fn get_token(&self, agent_id: &str, tenant_id: &str) -> Result<String> {
        let key = Self::cache_key(agent_id, tenant_id);

        // Clone the entry out so the exchange happens without the lock held.
        let entry = {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.get(&key).cloned()
        };

        let entry = entry.ok_or_else(|| CacheError::NotRegistered {
            agent_id: agent_id.to_string(),
            tenant_id: tenant_id.to_string(),
        })?;

        entry
            .generator
            .exchange_token(&entry.scopes)
            .await
            .map_err(|source| CacheError::ExchangeFailed {
                agent_id: agent_id.to_string(),
                source,
            })
    }

    /// Check whether a generator is registered for the principal.
    pub fn is_registered(&self, agent_id: &str, tenant_id: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(&Self::cache_key(agent_id, tenant_id))
    }

    /// Number of registered principals.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cache_key(agent_id: &str, tenant_id: &str) -> String {
        format!("{}:{}", agent_id, tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticGenerator {
        token: String,
        calls: AtomicUsize,
    }

    impl StaticGenerator {
        fn new(token: &str) -> Arc<Self> {
            Arc::new(Self {
                token: token.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TokenGenerator for StaticGenerator {
        async fn exchange_token(&self, _scopes: &[String]) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.token.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TokenGenerator for FailingGenerator {
        async fn exchange_token(&self, _scopes: &[String]) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("identity service unreachable"))
        }
    }

    #[tokio::test]
    async fn test_register_and_get_token() {
        let cache = TokenCache::new();
        cache
            .register("agent-1", "tenant-1", StaticGenerator::new("tok-abc"), vec![
                "https://telemetry.example/.default".to_string(),
            ])
            .unwrap();

        let token = cache.get_token("agent-1", "tenant-1").await.unwrap();
        assert_eq!(token, "tok-abc");
    }

    #[test]
    fn test_blank_agent_id_rejected() {
        let cache = TokenCache::new();
        let err = cache
            .register("", "tenant-1", StaticGenerator::new("tok"), vec![])
            .unwrap_err();

        assert!(matches!(err, CacheError::BlankArgument { field: "agent_id" }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_blank_tenant_id_rejected() {
        let cache = TokenCache::new();
        let err = cache
            .register("agent-1", "   ", StaticGenerator::new("tok"), vec![])
            .unwrap_err();

        assert!(matches!(err, CacheError::BlankArgument { field: "tenant_id" }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_registration_is_idempotent() {
        let cache = TokenCache::new();
        cache
            .register("agent-1", "tenant-1", StaticGenerator::new("first"), vec![])
            .unwrap();
        cache
            .register("agent-1", "tenant-1", StaticGenerator::new("second"), vec![])
            .unwrap();

        assert_eq!(cache.len(), 1);
        // First registration wins; the second does not refresh the entry.
        let token = cache.get_token("agent-1", "tenant-1").await.unwrap();
        assert_eq!(token, "first");
    }

    #[test]
    fn test_concurrent_registration_stores_one_entry() {
        let cache = Arc::new(TokenCache::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                cache
                    .register(
                        "agent-1",
                        "tenant-1",
                        StaticGenerator::new(&format!("tok-{}", i)),
                        vec![],
                    )
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_unregistered_principal_is_distinct_error() {
        let cache = TokenCache::new();
        let err = cache.get_token("ghost", "tenant-1").await.unwrap_err();

        assert!(matches!(err, CacheError::NotRegistered { .. }));
        assert!(!err.is_validation());
    }

    #[tokio::test]
    async fn test_exchange_failure_is_propagated() {
        let cache = TokenCache::new();
        cache
            .register("agent-1", "tenant-1", Arc::new(FailingGenerator), vec![])
            .unwrap();

        let err = cache.get_token("agent-1", "tenant-1").await.unwrap_err();
        assert!(matches!(err, CacheError::ExchangeFailed { .. }));
        assert!(err.to_string().contains("identity service unreachable"));
    }

    #[tokio::test]
    async fn test_generator_invoked_per_fetch() {
        let cache = TokenCache::new();
        let generator = StaticGenerator::new("tok");
        cache
            .register("agent-1", "tenant-1", Arc::clone(&generator) as Arc<dyn TokenGenerator>, vec![])
            .unwrap();

        cache.get_token("agent-1", "tenant-1").await.unwrap();
        cache.get_token("agent-1", "tenant-1").await.unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }
}
