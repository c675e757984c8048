//! Request and response types for the Stockroom API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Sign-in request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub min_stock: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Create/update payload for [`Product`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<f64>,
}

/// A lot of one product held in one warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub product_id: String,
    pub warehouse_id: String,
    pub lot_number: String,
    pub quantity: f64,
    #[serde(default)]
    pub manufactured_at: Option<NaiveDate>,
    #[serde(default)]
    pub expires_at: Option<NaiveDate>,
}

impl Batch {
    /// A batch is expired once its expiry date is before `today`; batches without one never expire
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < today)
    }
}

/// Create/update payload for [`Batch`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    pub product_id: String,
    pub warehouse_id: String,
    pub lot_number: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufactured_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

/// Storage location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Create/update payload for [`Warehouse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWarehouse {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub active: bool,
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    In,
    Out,
    Transfer,
    Adjustment,
}

/// Recorded stock movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub kind: MovementKind,
    pub product_id: String,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub from_warehouse_id: Option<String>,
    #[serde(default)]
    pub to_warehouse_id: Option<String>,
    pub quantity: f64,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create/update payload for [`StockMovement`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovement {
    pub kind: MovementKind,
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_warehouse_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_warehouse_id: Option<String>,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Move stock between two warehouses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    pub from_warehouse_id: String,
    pub to_warehouse_id: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Dashboard user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Create/update payload for [`User`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
}

/// Named permission set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Create/update payload for [`Role`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub permissions: Vec<String>,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(expires_at: Option<NaiveDate>) -> Batch {
        Batch {
            id: "b-1".to_string(),
            product_id: "p-1".to_string(),
            warehouse_id: "w-1".to_string(),
            lot_number: "L-2024-07".to_string(),
            quantity: 12.0,
            manufactured_at: None,
            expires_at,
        }
    }

    #[test]
    fn test_batch_expiry_is_a_date_comparison() {
        let today = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();

        assert!(!batch(None).is_expired(today));
        assert!(!batch(Some(today)).is_expired(today));
        assert!(batch(today.pred_opt()).is_expired(today));
        assert!(!batch(today.succ_opt()).is_expired(today));
    }

    #[test]
    fn test_movement_uses_api_field_names() {
        let movement: StockMovement = serde_json::from_str(
            r#"{
                "id": "m-1",
                "kind": "transfer",
                "productId": "p-1",
                "fromWarehouseId": "w-1",
                "toWarehouseId": "w-2",
                "quantity": 5,
                "createdAt": "2024-07-10T12:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(movement.kind, MovementKind::Transfer);
        assert_eq!(movement.to_warehouse_id.as_deref(), Some("w-2"));
        assert!(movement.batch_id.is_none());
    }

    #[test]
    fn test_warehouse_active_defaults_to_true() {
        let warehouse: Warehouse =
            serde_json::from_str(r#"{"id":"w-1","name":"Central"}"#).unwrap();
        assert!(warehouse.active);
    }
}
