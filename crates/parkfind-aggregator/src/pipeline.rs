//! The per-request aggregation pipeline.
//!
//! Locate, resolve client, and fetch run strictly in sequence. Enrichment
//! fans out one distance computation per fetched record; the merge waits for
//! every one of them before sorting.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use parkfind_core::{AppConfig, Coordinates, FailurePolicy, ParkingRecord};
use parkfind_providers::ProviderClientResolver;

use crate::distance::DistanceResolver;
use crate::error::AggregateError;
use crate::locator::ProviderLocator;

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub failure_policy: FailurePolicy,
    /// Upper bound for a single distance computation.
    pub distance_timeout: Duration,
    /// Maximum number of distance computations in flight per request.
    pub distance_max_concurrency: usize,
}

impl AggregatorSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            failure_policy: config.failure_policy,
            distance_timeout: Duration::from_millis(config.distance_timeout_ms),
            distance_max_concurrency: config.distance_max_concurrency,
        }
    }
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Lenient,
            distance_timeout: Duration::from_millis(2_000),
            distance_max_concurrency: 64,
        }
    }
}

/// Orchestrates locator, client resolver, and distance resolver.
///
/// Holds only read-only, shareable collaborators; one instance serves every
/// request concurrently.
#[derive(Clone)]
pub struct ParkingAggregator {
    locator: Arc<dyn ProviderLocator>,
    clients: ProviderClientResolver,
    distance: Arc<dyn DistanceResolver>,
    settings: AggregatorSettings,
}

impl std::fmt::Debug for ParkingAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkingAggregator")
            .field("clients", &self.clients)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ParkingAggregator {
    #[must_use]
    pub fn new(
        locator: Arc<dyn ProviderLocator>,
        clients: ProviderClientResolver,
        distance: Arc<dyn DistanceResolver>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            locator,
            clients,
            distance,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Returns the parkings served by the provider covering `(lat, lng)`,
    /// each with its distance from the point, nearest first.
    ///
    /// Parkings whose distance cannot be computed in time are left out.
    /// Equal distances keep the provider's order.
    ///
    /// # Errors
    ///
    /// - [`AggregateError::InvalidCoordinates`] for non-finite or out-of-range input.
    /// - [`AggregateError::Locator`] if the provider lookup itself fails.
    /// - [`AggregateError::NoProvider`], [`AggregateError::NoClient`], or
    ///   [`AggregateError::Fetch`] under [`FailurePolicy::Strict`]. The lenient
    ///   policy turns those into an empty list.
    pub async fn find_nearby_parkings(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Vec<ParkingRecord>, AggregateError> {
        let origin = Coordinates::new(lat, lng);
        if !origin.is_valid() {
            return Err(AggregateError::InvalidCoordinates { lat, lng });
        }

        let Some(provider) = self.locator.nearest_provider(origin).await? else {
            return self.degrade(AggregateError::NoProvider { lat, lng });
        };

        let Some(client) = self.clients.resolve(&provider) else {
            return self.degrade(AggregateError::NoClient {
                provider: provider.name,
            });
        };

        let records = match client.fetch_parkings(&provider).await {
            Ok(records) => records,
            Err(source) => {
                return self.degrade(AggregateError::Fetch {
                    provider: provider.name,
                    source,
                })
            }
        };
        let fetched = records.len();

        let mut enriched = self.enrich(origin, records).await;
        enriched.sort_by_key(|record| record.distance_m);

        tracing::info!(
            provider = %provider.name,
            fetched,
            returned = enriched.len(),
            "nearby parkings aggregated"
        );
        Ok(enriched)
    }

    /// Applies the failure policy to a request-level condition.
    fn degrade(&self, err: AggregateError) -> Result<Vec<ParkingRecord>, AggregateError> {
        match self.settings.failure_policy {
            FailurePolicy::Strict => Err(err),
            FailurePolicy::Lenient => {
                tracing::warn!(error = %err, "returning no parkings");
                Ok(Vec::new())
            }
        }
    }

    /// Computes every record's distance; records that fail or time out are
    /// dropped. Output keeps the input order.
    async fn enrich(&self, origin: Coordinates, records: Vec<ParkingRecord>) -> Vec<ParkingRecord> {
        let timeout = self.settings.distance_timeout;
        let concurrency = self.settings.distance_max_concurrency.max(1);

        let outcomes = stream::iter(records.into_iter().map(|record| {
            let distance = Arc::clone(&self.distance);
            async move {
                let target = record.coordinates();
                match tokio::time::timeout(timeout, distance.distance_in_meters(origin, target))
                    .await
                {
                    Ok(Ok(meters)) => Some(record.with_distance(meters)),
                    Ok(Err(e)) => {
                        tracing::warn!(
                            parking_id = record.id,
                            error = %e,
                            "distance failed, dropping parking"
                        );
                        None
                    }
                    Err(_) => {
                        tracing::warn!(
                            parking_id = record.id,
                            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                            "distance timed out, dropping parking"
                        );
                        None
                    }
                }
            }
        }))
        .buffered(concurrency)
        .collect::<Vec<_>>()
        .await;

        outcomes.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parkfind_core::{ProviderDescriptor, ProviderName};
    use parkfind_providers::{ParkingProviderClient, ProviderError};

    use super::*;
    use crate::distance::DistanceError;
    use crate::locator::LocatorError;

    // --- stubs ---

    enum LocatorStub {
        Found(ProviderDescriptor),
        Nothing,
        Broken,
    }

    #[async_trait]
    impl ProviderLocator for LocatorStub {
        async fn nearest_provider(
            &self,
            _point: Coordinates,
        ) -> Result<Option<ProviderDescriptor>, LocatorError> {
            match self {
                LocatorStub::Found(p) => Ok(Some(p.clone())),
                LocatorStub::Nothing => Ok(None),
                LocatorStub::Broken => Err(LocatorError::Backend("connection refused".to_owned())),
            }
        }
    }

    struct ClientStub {
        records: Vec<ParkingRecord>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ClientStub {
        fn returning(records: Vec<ParkingRecord>) -> Self {
            Self {
                records,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                records: vec![],
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ParkingProviderClient for ClientStub {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        fn supports(&self, provider: &ProviderDescriptor) -> bool {
            provider.name == ProviderName::GrandPoitiers
        }

        async fn fetch_parkings(
            &self,
            provider: &ProviderDescriptor,
        ) -> Result<Vec<ParkingRecord>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::UnexpectedStatus {
                    status: 502,
                    url: provider.api_url.clone(),
                });
            }
            Ok(self.records.clone())
        }
    }

    /// Distances keyed by parking latitude; unknown latitudes fail and
    /// `stall_lat` never completes.
    struct DistanceStub {
        by_lat: HashMap<u64, u32>,
        fallback: Option<u32>,
        stall_lat: Option<f64>,
    }

    impl DistanceStub {
        fn constant(meters: u32) -> Self {
            Self {
                by_lat: HashMap::new(),
                fallback: Some(meters),
                stall_lat: None,
            }
        }

        fn table(entries: &[(f64, u32)]) -> Self {
            Self {
                by_lat: entries.iter().map(|(lat, d)| (lat.to_bits(), *d)).collect(),
                fallback: None,
                stall_lat: None,
            }
        }
    }

    #[async_trait]
    impl DistanceResolver for DistanceStub {
        async fn distance_in_meters(
            &self,
            _from: Coordinates,
            to: Coordinates,
        ) -> Result<u32, DistanceError> {
            if self.stall_lat == Some(to.lat) {
                std::future::pending::<()>().await;
            }
            self.by_lat
                .get(&to.lat.to_bits())
                .copied()
                .or(self.fallback)
                .ok_or_else(|| DistanceError::Backend("routing backend unavailable".to_owned()))
        }
    }

    /// Shared counters observed by [`GaugedDistance`].
    #[derive(Default)]
    struct Gauge {
        started: AtomicUsize,
        in_flight: AtomicUsize,
        high_water: AtomicUsize,
        finished: AtomicUsize,
    }

    struct InFlight<'a>(&'a Gauge);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Sleeps for `delay` before answering; `None` never answers.
    struct GaugedDistance {
        gauge: Arc<Gauge>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl DistanceResolver for GaugedDistance {
        async fn distance_in_meters(
            &self,
            _from: Coordinates,
            _to: Coordinates,
        ) -> Result<u32, DistanceError> {
            let gauge = &*self.gauge;
            gauge.started.fetch_add(1, Ordering::SeqCst);
            let now = gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            gauge.high_water.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlight(gauge);

            match self.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
            gauge.finished.fetch_add(1, Ordering::SeqCst);
            Ok(100)
        }
    }

    // --- helpers ---

    fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::new(
            1,
            ProviderName::GrandPoitiers,
            "https://provider.example/lines",
            Coordinates::new(48.8566, 2.3522),
            10.0,
        )
    }

    fn record(id: i64, lat: f64, lng: f64) -> ParkingRecord {
        ParkingRecord {
            id,
            lat,
            lng,
            available_places: Some(10),
            capacity: Some(100),
            name: format!("Parking {id}"),
            distance_m: None,
        }
    }

    fn aggregator(
        locator: LocatorStub,
        client: Option<Arc<ClientStub>>,
        distance: DistanceStub,
        policy: FailurePolicy,
    ) -> ParkingAggregator {
        let mut clients = ProviderClientResolver::new();
        if let Some(client) = client {
            clients = clients.register(client);
        }
        ParkingAggregator::new(
            Arc::new(locator),
            clients,
            Arc::new(distance),
            AggregatorSettings {
                failure_policy: policy,
                distance_timeout: Duration::from_millis(200),
                distance_max_concurrency: 8,
            },
        )
    }

    // --- enrichment and ordering ---

    #[tokio::test]
    async fn equal_distances_keep_fetch_order() {
        let client = Arc::new(ClientStub::returning(vec![
            record(1, 48.8550, 2.3515),
            record(2, 48.8570, 2.3530),
        ]));
        let agg = aggregator(
            LocatorStub::Found(descriptor()),
            Some(client),
            DistanceStub::constant(10),
            FailurePolicy::Lenient,
        );

        let result = agg.find_nearby_parkings(48.8566, 2.3522).await.unwrap();

        assert_eq!(result.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(result.iter().all(|r| r.distance_m == Some(10)));
    }

    #[tokio::test]
    async fn sorts_by_distance_ascending() {
        let client = Arc::new(ClientStub::returning(vec![
            record(1, 48.1, 2.0),
            record(2, 48.2, 2.0),
            record(3, 48.3, 2.0),
            record(4, 48.4, 2.0),
        ]));
        let agg = aggregator(
            LocatorStub::Found(descriptor()),
            Some(client),
            DistanceStub::table(&[(48.1, 900), (48.2, 15), (48.3, 400), (48.4, 15)]),
            FailurePolicy::Lenient,
        );

        let result = agg.find_nearby_parkings(48.0, 2.0).await.unwrap();

        assert_eq!(
            result.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![2, 4, 3, 1]
        );
        assert!(result
            .windows(2)
            .all(|pair| pair[0].distance_m <= pair[1].distance_m));
    }

    #[tokio::test]
    async fn failed_distance_drops_only_that_record() {
        let client = Arc::new(ClientStub::returning(vec![
            record(1, 48.1, 2.0),
            record(2, 48.2, 2.0),
            record(3, 48.3, 2.0),
        ]));
        let agg = aggregator(
            LocatorStub::Found(descriptor()),
            Some(client),
            // 48.2 has no entry and fails.
            DistanceStub::table(&[(48.1, 300), (48.3, 100)]),
            FailurePolicy::Strict,
        );

        let result = agg.find_nearby_parkings(48.0, 2.0).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 3);
        assert_eq!(result[0].distance_m, Some(100));
        assert_eq!(result[1].id, 1);
        assert_eq!(result[1].distance_m, Some(300));
    }

    #[tokio::test]
    async fn timed_out_distance_drops_only_that_record() {
        let client = Arc::new(ClientStub::returning(vec![
            record(1, 48.1, 2.0),
            record(2, 48.2, 2.0),
        ]));
        let mut distance = DistanceStub::constant(50);
        distance.stall_lat = Some(48.2);
        let agg = aggregator(
            LocatorStub::Found(descriptor()),
            Some(client),
            distance,
            FailurePolicy::Lenient,
        );

        let result = agg.find_nearby_parkings(48.0, 2.0).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);
    }

    #[tokio::test]
    async fn empty_fetch_returns_empty_list() {
        let agg = aggregator(
            LocatorStub::Found(descriptor()),
            Some(Arc::new(ClientStub::returning(vec![]))),
            DistanceStub::constant(1),
            FailurePolicy::Strict,
        );
        assert!(agg.find_nearby_parkings(48.0, 2.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_requests_return_same_records() {
        let client = Arc::new(ClientStub::returning(vec![
            record(1, 48.1, 2.0),
            record(2, 48.2, 2.0),
        ]));
        let agg = aggregator(
            LocatorStub::Found(descriptor()),
            Some(Arc::clone(&client)),
            DistanceStub::table(&[(48.1, 20), (48.2, 10)]),
            FailurePolicy::Lenient,
        );

        let first = agg.find_nearby_parkings(48.0, 2.0).await.unwrap();
        let second = agg.find_nearby_parkings(48.0, 2.0).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrency_of_zero_still_makes_progress() {
        let client = Arc::new(ClientStub::returning(vec![record(1, 48.1, 2.0)]));
        let mut agg = aggregator(
            LocatorStub::Found(descriptor()),
            Some(client),
            DistanceStub::constant(5),
            FailurePolicy::Lenient,
        );
        agg.settings.distance_max_concurrency = 0;

        let result = agg.find_nearby_parkings(48.0, 2.0).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    fn gauged_aggregator(
        count: i32,
        delay: Option<Duration>,
        concurrency: usize,
    ) -> (ParkingAggregator, Arc<Gauge>) {
        let records = (0..count)
            .map(|i| record(i64::from(i), 48.0 + 0.001 * f64::from(i), 2.0))
            .collect();
        let gauge = Arc::new(Gauge::default());
        let agg = ParkingAggregator::new(
            Arc::new(LocatorStub::Found(descriptor())),
            ProviderClientResolver::new().register(Arc::new(ClientStub::returning(records))),
            Arc::new(GaugedDistance {
                gauge: Arc::clone(&gauge),
                delay,
            }),
            AggregatorSettings {
                failure_policy: FailurePolicy::Strict,
                distance_timeout: Duration::from_secs(10),
                distance_max_concurrency: concurrency,
            },
        );
        (agg, gauge)
    }

    #[tokio::test]
    async fn distance_calls_run_concurrently() {
        let (agg, gauge) = gauged_aggregator(20, Some(Duration::from_millis(100)), 64);

        let started = std::time::Instant::now();
        let result = agg.find_nearby_parkings(48.0, 2.0).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(result.len(), 20);
        // Sequential calls would need 2 s.
        assert!(elapsed < Duration::from_millis(1_000), "took {elapsed:?}");
        assert_eq!(gauge.high_water.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn in_flight_distance_calls_stay_within_limit() {
        let (agg, gauge) = gauged_aggregator(12, Some(Duration::from_millis(20)), 3);

        let result = agg.find_nearby_parkings(48.0, 2.0).await.unwrap();

        assert_eq!(result.len(), 12);
        assert_eq!(gauge.finished.load(Ordering::SeqCst), 12);
        assert_eq!(gauge.high_water.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn dropping_request_cancels_pending_distance_calls() {
        let (agg, gauge) = gauged_aggregator(10, None, 4);

        let outcome = tokio::time::timeout(
            Duration::from_millis(100),
            agg.find_nearby_parkings(48.0, 2.0),
        )
        .await;

        assert!(outcome.is_err(), "request should still be pending");
        assert_eq!(gauge.started.load(Ordering::SeqCst), 4);
        assert_eq!(gauge.in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(gauge.finished.load(Ordering::SeqCst), 0);
    }

    // --- request-level conditions ---

    #[tokio::test]
    async fn rejects_invalid_coordinates() {
        let agg = aggregator(
            LocatorStub::Nothing,
            None,
            DistanceStub::constant(1),
            FailurePolicy::Lenient,
        );

        for (lat, lng) in [(91.0, 0.0), (0.0, -180.5), (f64::NAN, 0.0), (0.0, f64::INFINITY)] {
            let err = agg.find_nearby_parkings(lat, lng).await.unwrap_err();
            assert!(
                matches!(err, AggregateError::InvalidCoordinates { .. }),
                "({lat}, {lng}) gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn locator_failure_is_fatal_under_either_policy() {
        for policy in [FailurePolicy::Lenient, FailurePolicy::Strict] {
            let agg = aggregator(
                LocatorStub::Broken,
                None,
                DistanceStub::constant(1),
                policy,
            );
            let err = agg.find_nearby_parkings(48.0, 2.0).await.unwrap_err();
            assert!(matches!(err, AggregateError::Locator(_)));
        }
    }

    #[tokio::test]
    async fn lenient_policy_degrades_to_empty() {
        let no_provider = aggregator(
            LocatorStub::Nothing,
            Some(Arc::new(ClientStub::returning(vec![record(1, 48.1, 2.0)]))),
            DistanceStub::constant(1),
            FailurePolicy::Lenient,
        );
        let no_client = aggregator(
            LocatorStub::Found(descriptor()),
            None,
            DistanceStub::constant(1),
            FailurePolicy::Lenient,
        );
        let fetch_failed = aggregator(
            LocatorStub::Found(descriptor()),
            Some(Arc::new(ClientStub::failing())),
            DistanceStub::constant(1),
            FailurePolicy::Lenient,
        );

        for agg in [no_provider, no_client, fetch_failed] {
            assert!(agg.find_nearby_parkings(48.0, 2.0).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn strict_policy_reports_no_provider() {
        let agg = aggregator(
            LocatorStub::Nothing,
            None,
            DistanceStub::constant(1),
            FailurePolicy::Strict,
        );
        let err = agg.find_nearby_parkings(48.0, 2.0).await.unwrap_err();
        assert!(matches!(err, AggregateError::NoProvider { .. }));
    }

    #[tokio::test]
    async fn strict_policy_reports_no_client() {
        let agg = aggregator(
            LocatorStub::Found(descriptor()),
            None,
            DistanceStub::constant(1),
            FailurePolicy::Strict,
        );
        let err = agg.find_nearby_parkings(48.0, 2.0).await.unwrap_err();
        assert!(matches!(
            err,
            AggregateError::NoClient {
                provider: ProviderName::GrandPoitiers
            }
        ));
    }

    #[tokio::test]
    async fn strict_policy_reports_fetch_failure() {
        let agg = aggregator(
            LocatorStub::Found(descriptor()),
            Some(Arc::new(ClientStub::failing())),
            DistanceStub::constant(1),
            FailurePolicy::Strict,
        );
        let err = agg.find_nearby_parkings(48.0, 2.0).await.unwrap_err();
        assert!(matches!(
            err,
            AggregateError::Fetch {
                source: ProviderError::UnexpectedStatus { status: 502, .. },
                ..
            }
        ));
    }

    #[test]
    fn settings_follow_app_config() {
        let config = parkfind_core::build_app_config(|key| match key {
            "PARKFIND_FAILURE_POLICY" => Ok("strict".to_owned()),
            "PARKFIND_DISTANCE_TIMEOUT_MS" => Ok("750".to_owned()),
            "PARKFIND_DISTANCE_MAX_CONCURRENCY" => Ok("4".to_owned()),
            _ => Err(std::env::VarError::NotPresent),
        })
        .unwrap();

        let settings = AggregatorSettings::from_app_config(&config);
        assert_eq!(settings.failure_policy, FailurePolicy::Strict);
        assert_eq!(settings.distance_timeout, Duration::from_millis(750));
        assert_eq!(settings.distance_max_concurrency, 4);
    }
}
