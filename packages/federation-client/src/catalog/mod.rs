//! Field catalog resolver.
//!
//! Resolves the selectable options for equipment fields: the predefined
//! list merged with values other users have contributed. One
//! [`FieldCatalog`] is built at startup and shared (behind an `Arc`) by
//! every form, so they all see the same cache.
//!
//! # Example
//!
//! ```rust,ignore
//! let catalog = Arc::new(FieldCatalog::from_config(api.clone(), &config));
//!
//! let brands = catalog
//!     .resolve(FieldType::RubberBrand, FieldType::RubberBrand.predefined())
//!     .await?;
//! if let Some(error) = &brands.error {
//!     show_banner(error);
//! }
//! ```

pub mod cache;
pub mod queue;

pub use cache::{merge_options, OptionCache};
pub use queue::RequestLane;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::FederationApi;
use crate::config::ClientConfig;
use crate::error::{FederationError, Result, ValidationErrors};
use crate::schema::catalog_for_field;
use crate::types::{CustomFieldAdded, CustomFieldCheck, FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsOrigin {
    Cache,
    Remote,
    /// The caller's fallback list, after a failed fetch
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogOptions {
    pub options: Vec<String>,
    /// Human-readable reason when the fallback list was used
    pub error: Option<String>,
    pub origin: OptionsOrigin,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Skip the cache for this key and refetch.
    pub force_refresh: bool,
    /// Cancelled when the consuming view goes away.
    pub cancel: Option<CancellationToken>,
}

impl FetchOptions {
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

pub struct FieldCatalog {
    api: Arc<dyn FederationApi>,
    cache: OptionCache,
    lane: RequestLane,
    inflight: Mutex<HashMap<FieldType, (u64, CancellationToken)>>,
    tickets: AtomicU64,
}

impl FieldCatalog {
    pub fn new(api: Arc<dyn FederationApi>, ttl: Duration, min_delay: Duration) -> Self {
        Self {
            api,
            cache: OptionCache::new(ttl),
            lane: RequestLane::new(min_delay),
            inflight: Mutex::new(HashMap::new()),
            tickets: AtomicU64::new(0),
        }
    }

    pub fn from_config(api: Arc<dyn FederationApi>, config: &ClientConfig) -> Self {
        Self::new(api, config.catalog_ttl, config.catalog_delay)
    }

    /// Options for `field_type`, or `fallback` with an error if the fetch fails.
    pub async fn resolve(&self, field_type: FieldType, fallback: &[&str]) -> Result<CatalogOptions> {
        self.resolve_with(field_type, fallback, FetchOptions::default())
            .await
    }

    /// Like [`resolve`](Self::resolve), with refresh and cancellation control.
    ///
    /// Only fails with [`FederationError::Cancelled`]: when a newer fetch for
    /// the same field type starts, or `options.cancel` fires, before this
    /// one completes.
    pub async fn resolve_with(
        &self,
        field_type: FieldType,
        fallback: &[&str],
        options: FetchOptions,
    ) -> Result<CatalogOptions> {
        if options.force_refresh {
            self.cache.invalidate(field_type);
        } else if let Some(cached) = self.cache.get_fresh(field_type) {
            debug!(field_type = %field_type, count = cached.len(), "Catalog cache hit");
            return Ok(CatalogOptions {
                options: cached,
                error: None,
                origin: OptionsOrigin::Cache,
            });
        }

        let (ticket, superseded) = self.begin(field_type);
        let view = options.cancel.unwrap_or_else(CancellationToken::new);

        info!(field_type = %field_type, "Fetching catalog options");
        let outcome = tokio::select! {
            biased;
            _ = superseded.cancelled() => None,
            _ = view.cancelled() => None,
            result = self.lane.run(self.api.dynamic_options(field_type)) => Some(result),
        };
        self.finish(field_type, ticket);

        let Some(result) = outcome else {
            debug!(field_type = %field_type, "Catalog fetch cancelled, result discarded");
            return Err(FederationError::Cancelled);
        };

        match result {
            Ok(remote) => {
                let merged = merge_options(field_type.predefined(), &remote);
                let stored = self.cache.put(field_type, merged);
                Ok(CatalogOptions {
                    options: stored,
                    error: None,
                    origin: OptionsOrigin::Remote,
                })
            }
            Err(err) => {
                warn!(field_type = %field_type, error = %err, "Catalog fetch failed, using fallback");
                Ok(CatalogOptions {
                    options: fallback.iter().map(|s| s.to_string()).collect(),
                    error: Some(fallback_message(field_type, &err)),
                    origin: OptionsOrigin::Fallback,
                })
            }
        }
    }

    /// Options for a form's brand or model select, e.g. `drive_rubber_brand`,
    /// falling back to the catalog's predefined list. `None` when the field
    /// has no catalog.
    pub async fn resolve_field(
        &self,
        field: &str,
        options: FetchOptions,
    ) -> Result<Option<CatalogOptions>> {
        let Some(field_type) = catalog_for_field(field) else {
            return Ok(None);
        };
        self.resolve_with(field_type, field_type.predefined(), options)
            .await
            .map(Some)
    }

    /// Register an in-flight fetch, cancelling any earlier one for the key.
    fn begin(&self, field_type: FieldType) -> (u64, CancellationToken) {
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, previous)) = inflight.insert(field_type, (ticket, token.clone())) {
            previous.cancel();
        }
        (ticket, token)
    }

    fn finish(&self, field_type: FieldType, ticket: u64) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if inflight.get(&field_type).is_some_and(|(t, _)| *t == ticket) {
            inflight.remove(&field_type);
        }
    }

    /// Add a value to the local list without contacting the service.
    ///
    /// The value is trimmed; blank values and values already listed are
    /// ignored. Returns whether the list changed.
    pub fn add_option_to_list(&self, field_type: FieldType, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        let added = self.cache.add(field_type, value, field_type.predefined());
        if added {
            debug!(field_type = %field_type, value, "Added option to local list");
        }
        added
    }

    /// Currently cached options, fresh or stale.
    pub fn cached(&self, field_type: FieldType) -> Option<Vec<String>> {
        self.cache.get(field_type)
    }

    pub fn invalidate(&self, field_type: FieldType) {
        self.cache.invalidate(field_type);
    }

    /// Ask the service whether `value` duplicates a known entry.
    pub async fn check_custom_value(
        &self,
        field_type: FieldType,
        value: &str,
    ) -> Result<CustomFieldCheck> {
        let value = require_value(value)?;
        self.api.validate_custom_field(field_type, value).await
    }

    /// Register a custom value with the service and, on success, add the
    /// stored spelling to the local list.
    pub async fn register_custom_value(
        &self,
        field_type: FieldType,
        value: &str,
    ) -> Result<CustomFieldAdded> {
        let value = require_value(value)?;
        let added = self.api.add_custom_field(field_type, value).await?;
        if added.success {
            let stored = added.field.as_ref().map_or(value, |f| f.value.as_str());
            self.add_option_to_list(field_type, stored);
            info!(field_type = %field_type, value = stored, was_new = added.was_new, "Custom value registered");
        }
        Ok(added)
    }
}

fn require_value(value: &str) -> Result<&str> {
    let value = value.trim();
    if value.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.push("value", "The value field is required.");
        return Err(FederationError::Validation(errors));
    }
    Ok(value)
}

fn fallback_message(field_type: FieldType, error: &FederationError) -> String {
    match error {
        FederationError::RateLimited(_) => format!(
            "Rate limit reached while loading {field_type} options; showing the default list. Try again in a moment."
        ),
        other => format!(
            "Could not load {field_type} options ({other}); showing the default list."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;

    fn catalog(api: &Arc<MockApi>) -> FieldCatalog {
        FieldCatalog::new(api.clone(), Duration::from_secs(300), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_second_resolve_hits_cache() {
        let api = Arc::new(MockApi::new().with_options(FieldType::RubberBrand, &["Sanwei"]));
        let catalog = catalog(&api);

        let first = catalog.resolve(FieldType::RubberBrand, &[]).await.unwrap();
        let second = catalog.resolve(FieldType::RubberBrand, &[]).await.unwrap();

        assert_eq!(first.origin, OptionsOrigin::Remote);
        assert_eq!(second.origin, OptionsOrigin::Cache);
        assert_eq!(first.options, second.options);
        assert_eq!(api.option_fetches(FieldType::RubberBrand), 1);
    }

    #[tokio::test]
    async fn test_predefined_precede_remote() {
        let api = Arc::new(MockApi::new().with_options(FieldType::RubberHardness, &["Ultra soft", "Hard"]));
        let options = catalog(&api)
            .resolve(FieldType::RubberHardness, &[])
            .await
            .unwrap()
            .options;
        assert_eq!(options, vec!["Soft", "Medium", "Hard", "Extra hard", "Ultra soft"]);
    }

    #[tokio::test]
    async fn test_resolve_field_uses_slot_catalog() {
        let api = Arc::new(MockApi::new().rate_limited(FieldType::RubberModel));
        let catalog = catalog(&api);

        // Both rubber slots share one catalog, so the second select is a cache hit
        let drive = catalog
            .resolve_field("drive_rubber_brand", FetchOptions::default())
            .await
            .unwrap()
            .unwrap();
        let backhand = catalog
            .resolve_field("backhand_rubber_brand", FetchOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(drive.origin, OptionsOrigin::Remote);
        assert_eq!(backhand.origin, OptionsOrigin::Cache);
        assert_eq!(api.option_fetches(FieldType::RubberBrand), 1);

        let model = catalog
            .resolve_field("racket_model", FetchOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(model.origin, OptionsOrigin::Remote);
        assert_eq!(api.option_fetches(FieldType::RacketModel), 1);

        let fallback = catalog
            .resolve_field("drive_rubber_model", FetchOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fallback.origin, OptionsOrigin::Fallback);
        let predefined: Vec<String> = FieldType::RubberModel
            .predefined()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(fallback.options, predefined);

        assert!(catalog
            .resolve_field("city", FetchOptions::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_force_refresh_refetches_only_that_key() {
        let api = Arc::new(MockApi::new());
        let catalog = catalog(&api);

        catalog.resolve(FieldType::RubberBrand, &[]).await.unwrap();
        catalog.resolve(FieldType::RacketBrand, &[]).await.unwrap();
        catalog
            .resolve_with(FieldType::RubberBrand, &[], FetchOptions::refresh())
            .await
            .unwrap();
        catalog.resolve(FieldType::RacketBrand, &[]).await.unwrap();

        assert_eq!(api.option_fetches(FieldType::RubberBrand), 2);
        assert_eq!(api.option_fetches(FieldType::RacketBrand), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_falls_back() {
        let api = Arc::new(MockApi::new().rate_limited(FieldType::RacketModel));
        let catalog = catalog(&api);

        let result = catalog
            .resolve(FieldType::RacketModel, &["Viscaria", "Korbel"])
            .await
            .unwrap();

        assert_eq!(result.origin, OptionsOrigin::Fallback);
        assert_eq!(result.options, vec!["Viscaria", "Korbel"]);
        let error = result.error.unwrap();
        assert!(error.contains("Rate limit"), "unexpected message: {error}");

        // Fallbacks are not cached
        catalog.resolve(FieldType::RacketModel, &[]).await.unwrap();
        assert_eq!(api.option_fetches(FieldType::RacketModel), 2);
    }

    #[tokio::test]
    async fn test_add_option_is_idempotent_and_sorted() {
        let api = Arc::new(MockApi::new().with_options(FieldType::RubberBrand, &["Sanwei"]));
        let catalog = catalog(&api);
        catalog.resolve(FieldType::RubberBrand, &[]).await.unwrap();

        assert!(catalog.add_option_to_list(FieldType::RubberBrand, "  Andro "));
        assert!(!catalog.add_option_to_list(FieldType::RubberBrand, "Andro"));
        assert!(!catalog.add_option_to_list(FieldType::RubberBrand, "   "));

        let options = catalog.cached(FieldType::RubberBrand).unwrap();
        assert_eq!(options.iter().filter(|o| *o == "Andro").count(), 1);
        assert_eq!(options.first().map(String::as_str), Some("Andro"));
        let mut sorted = options.clone();
        sorted.sort_by_key(|o| o.to_lowercase());
        assert_eq!(options, sorted);
        assert!(api.calls().len() == 1, "local additions must not call the API");
    }

    #[tokio::test]
    async fn test_newer_fetch_cancels_older() {
        let api = Arc::new(MockApi::new().with_latency(Duration::from_millis(100)));
        let catalog = Arc::new(catalog(&api));

        let older = {
            let catalog = catalog.clone();
            tokio::spawn(async move { catalog.resolve(FieldType::RubberModel, &[]).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let newer = catalog
            .resolve_with(FieldType::RubberModel, &[], FetchOptions::refresh())
            .await
            .unwrap();

        assert!(matches!(older.await.unwrap(), Err(FederationError::Cancelled)));
        assert_eq!(newer.origin, OptionsOrigin::Remote);
    }

    #[tokio::test]
    async fn test_view_teardown_cancels() {
        let api = Arc::new(MockApi::new().with_latency(Duration::from_millis(200)));
        let catalog = catalog(&api);
        let view = CancellationToken::new();

        let canceller = view.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = catalog
            .resolve_with(
                FieldType::RacketBrand,
                &[],
                FetchOptions::default().with_cancel(view),
            )
            .await;
        assert!(matches!(result, Err(FederationError::Cancelled)));
        assert!(catalog.cached(FieldType::RacketBrand).is_none());
    }

    #[tokio::test]
    async fn test_register_custom_value_adds_stored_spelling() {
        let api = Arc::new(MockApi::new());
        let catalog = catalog(&api);

        let added = catalog
            .register_custom_value(FieldType::RubberBrand, "  sanwei ")
            .await
            .unwrap();
        assert!(added.success);
        assert!(catalog
            .cached(FieldType::RubberBrand)
            .unwrap()
            .contains(&"sanwei".to_string()));

        let err = catalog
            .register_custom_value(FieldType::RubberBrand, " ")
            .await
            .unwrap_err();
        assert!(matches!(err, FederationError::Validation(_)));
    }
}
