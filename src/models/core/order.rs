//! # Order Model
//!
//! Tenant-scoped order rows carrying the denormalized current state and
//! current station pointer. The append-only timeline lives in
//! `order_internal_event`; this row is the fast-path read model the router
//! and queue queries key off.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::state_machine::{InternalOrderState, StationType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: i64,
    pub tenant_id: Uuid,
    pub order_number: String,
    pub tracking_number: Option<String>,
    pub carrier_code: Option<String>,
    pub region: Option<String>,
    pub payment_method: Option<String>,
    pub order_value: Option<Decimal>,
    pub cod: bool,
    pub current_state: String,
    pub current_station: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// New Order for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub tenant_id: Uuid,
    pub order_number: String,
    pub tracking_number: Option<String>,
    pub carrier_code: Option<String>,
    pub region: Option<String>,
    pub payment_method: Option<String>,
    pub order_value: Option<Decimal>,
    pub cod: bool,
}

impl Order {
    pub async fn create(pool: &PgPool, new_order: NewOrder) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO fulfillment_orders
            (tenant_id, order_number, tracking_number, carrier_code, region,
             payment_method, order_value, cod, current_state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'new', NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(new_order.tenant_id)
        .bind(new_order.order_number)
        .bind(new_order.tracking_number)
        .bind(new_order.carrier_code)
        .bind(new_order.region)
        .bind(new_order.payment_method)
        .bind(new_order.order_value)
        .bind(new_order.cod)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM fulfillment_orders WHERE tenant_id = $1 AND order_id = $2",
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(pool)
        .await
    }

    /// Resolve an order from a carrier tracking number, tenant-scoped
    pub async fn find_by_tracking_number(
        pool: &PgPool,
        tenant_id: Uuid,
        tracking_number: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM fulfillment_orders WHERE tenant_id = $1 AND tracking_number = $2",
        )
        .bind(tenant_id)
        .bind(tracking_number)
        .fetch_optional(pool)
        .await
    }

    /// Persist a new current state for the order
    pub async fn update_state(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
        to_state: InternalOrderState,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE fulfillment_orders
            SET current_state = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND order_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(to_state.to_string())
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Update the denormalized current-station pointer
    pub async fn update_current_station(
        pool: &PgPool,
        tenant_id: Uuid,
        order_id: i64,
        station: Option<StationType>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE fulfillment_orders
            SET current_station = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND order_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(station.map(|s| s.to_string()))
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Parse the stored state into the typed enum
    pub fn state(&self) -> Result<InternalOrderState, String> {
        self.current_state.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_order(state: &str) -> Order {
        Order {
            order_id: 1,
            tenant_id: Uuid::new_v4(),
            order_number: "ORD-1001".to_string(),
            tracking_number: Some("T1".to_string()),
            carrier_code: Some("aramex".to_string()),
            region: Some("riyadh".to_string()),
            payment_method: Some("cod".to_string()),
            order_value: None,
            cod: true,
            current_state: state.to_string(),
            current_station: None,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_state_parses_stored_value() {
        let order = sample_order("out_for_delivery");
        assert_eq!(order.state().unwrap(), InternalOrderState::OutForDelivery);
    }

    #[test]
    fn test_state_rejects_corrupt_value() {
        let order = sample_order("warp_drive");
        assert!(order.state().is_err());
    }
}
