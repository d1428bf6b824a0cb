//! # System Bootstrap
//!
//! Wires the pipeline together from resolved configuration: one shared
//! pool, one event publisher, and the services layered on top. This is the
//! embedding surface for the API layer.

use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::configuration::ConfigurationSurface;
use super::dead_letter::DeadLetterBoundary;
use super::errors::WorkflowError;
use super::event_processor::ShipmentEventProcessor;
use super::idempotency::IdempotencyLedger;
use crate::config::FulfillmentConfig;
use crate::constants::workflows;
use crate::database::DatabaseConnection;
use crate::events::EventPublisher;
use crate::ingestion::IngestionService;
use crate::normalizer::{DefaultMappingTable, StatusNormalizer};
use crate::performance::{CourierPerformanceEngine, PerformanceRunOutcome, SmartRoutingScorer};
use crate::routing::StationRouter;

pub struct FulfillmentSystem {
    pool: PgPool,
    publisher: EventPublisher,
    boundary: DeadLetterBoundary,
    normalizer: Arc<StatusNormalizer>,
    router: Arc<StationRouter>,
    ingestion: IngestionService,
    performance: CourierPerformanceEngine,
    smart_routing: SmartRoutingScorer,
    configuration: ConfigurationSurface,
}

impl FulfillmentSystem {
    /// Wire the full pipeline over an existing pool
    pub fn new(pool: PgPool, config: &FulfillmentConfig) -> Self {
        let publisher = EventPublisher::default();
        let defaults = Arc::new(DefaultMappingTable::from_config(
            &config.default_status_mappings,
        ));
        let normalizer = Arc::new(StatusNormalizer::new(pool.clone(), Arc::clone(&defaults)));
        let router = Arc::new(StationRouter::new(
            pool.clone(),
            config.slas.clone(),
            publisher.clone(),
        ));
        let ledger = IdempotencyLedger::new(pool.clone());
        let boundary = DeadLetterBoundary::new(pool.clone(), publisher.clone());

        let processor = Arc::new(ShipmentEventProcessor::new(
            pool.clone(),
            Arc::clone(&normalizer),
            Arc::clone(&router),
            publisher.clone(),
            ledger.clone(),
            boundary.clone(),
        ));

        let ingestion = IngestionService::new(Arc::clone(&processor), config.ingestion.clone());
        let performance = CourierPerformanceEngine::new(
            pool.clone(),
            ledger.clone(),
            config.scoring.clone(),
            publisher.clone(),
        );
        let smart_routing = SmartRoutingScorer::new(pool.clone());
        let configuration = ConfigurationSurface::new(pool.clone(), Arc::clone(&normalizer));

        Self {
            pool,
            publisher,
            boundary,
            normalizer,
            router,
            ingestion,
            performance,
            smart_routing,
            configuration,
        }
    }

    /// Connect to the configured database and wire the pipeline
    pub async fn connect(config: &FulfillmentConfig) -> crate::error::Result<Self> {
        let connection = DatabaseConnection::new(&config.database).await?;
        Ok(Self::new(connection.pool().clone(), config))
    }

    /// Courier performance run for a tenant, inside the failure boundary
    pub async fn compute_courier_performance(
        &self,
        tenant_id: Uuid,
        date: Option<chrono::NaiveDate>,
    ) -> Result<PerformanceRunOutcome, WorkflowError> {
        self.boundary
            .run(
                workflows::COURIER_PERFORMANCE,
                Some(tenant_id),
                json!({ "tenant_id": tenant_id, "date": date.map(|d| d.to_string()) }),
                self.performance.compute(tenant_id, date),
            )
            .await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn normalizer(&self) -> &Arc<StatusNormalizer> {
        &self.normalizer
    }

    pub fn router(&self) -> &Arc<StationRouter> {
        &self.router
    }

    pub fn ingestion(&self) -> &IngestionService {
        &self.ingestion
    }

    pub fn smart_routing(&self) -> &SmartRoutingScorer {
        &self.smart_routing
    }

    pub fn configuration(&self) -> &ConfigurationSurface {
        &self.configuration
    }
}
