//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key normalization, generation purging and the
//! fetch-once behaviour of cache-first.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use url::Url;

use crate::cache::{CacheStorage, MemoryCacheStorage, RequestKey};
use crate::config::AgentConfig;
use crate::fetch::ScriptedFetcher;
use crate::lifecycle::LifecycleManager;
use crate::models::AgentRequest;
use crate::strategy::{NavigationFallbacks, StrategyExecutor};
use crate::tasks::RevalidationQueue;

// == Strategies ==
fn path_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}(/[a-z0-9]{1,8}){0,2}".prop_map(|s| s)
}

fn tag_strategy() -> impl Strategy<Value = String> {
    "v[0-9]{1,2}".prop_map(|s| s)
}

fn generation_strategy() -> impl Strategy<Value = String> {
    (prop_oneof![Just("core"), Just("runtime"), Just("legacy")], tag_strategy())
        .prop_map(|(role, tag)| format!("{}-{}", role, tag))
}

fn base() -> Url {
    Url::parse("http://localhost:8080/").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Fragments never change the cache identity of a request
    #[test]
    fn prop_fragment_does_not_change_key(path in path_strategy(), fragment in "[a-z]{0,8}") {
        let plain = base().join(&path).unwrap();
        let mut with_fragment = plain.clone();
        with_fragment.set_fragment(Some(&fragment));

        prop_assert_eq!(RequestKey::get(&plain), RequestKey::get(&with_fragment));
    }

    // After activation only the current core/runtime generations remain
    #[test]
    fn prop_activation_keeps_only_current_generations(
        existing in prop::collection::vec(generation_strategy(), 0..10),
        tag in tag_strategy(),
    ) {
        let config = Arc::new(AgentConfig::default().with_version_tag(tag.clone()));
        let storage = Arc::new(MemoryCacheStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        let lifecycle = LifecycleManager::new(config.clone(), storage.clone(), fetcher);

        let remaining: HashSet<String> = tokio_test::block_on(async {
            for name in &existing {
                storage.open(name).await.unwrap();
            }
            lifecycle.install().await.unwrap();
            lifecycle.activate().await.unwrap();
            storage.keys().await.unwrap().into_iter().collect()
        });

        let current: HashSet<String> =
            [config.core_generation(), config.runtime_generation()].into_iter().collect();
        prop_assert!(remaining.is_subset(&current));
        prop_assert!(remaining.contains(&config.core_generation()));
        let runtime_existed = existing.contains(&config.runtime_generation());
        prop_assert_eq!(remaining.contains(&config.runtime_generation()), runtime_existed);
    }

    // Cache-first fetches each distinct URL at most once, however often it is requested
    #[test]
    fn prop_cache_first_fetches_each_url_once(paths in prop::collection::vec(path_strategy(), 1..20)) {
        let storage = Arc::new(MemoryCacheStorage::new());
        let fetcher = Arc::new(ScriptedFetcher::new());
        for path in &paths {
            fetcher.set_ok(&base().join(path).unwrap(), "text/plain", path);
        }
        let executor = StrategyExecutor::new(
            storage,
            fetcher.clone(),
            RevalidationQueue::new(),
            NavigationFallbacks {
                main_document: RequestKey::get(&base().join("./index.html").unwrap()),
                base_path: RequestKey::get(&base()),
            },
        );

        tokio_test::block_on(async {
            for path in &paths {
                let request = AgentRequest::get(base().join(path).unwrap());
                let response = executor.cache_first(&request, "runtime-v1").await.unwrap();
                assert_eq!(&response.body[..], path.as_bytes());
            }
        });

        let distinct: HashSet<&String> = paths.iter().collect();
        prop_assert_eq!(fetcher.total_calls(), distinct.len());
    }
}
