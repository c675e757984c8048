//! Typed CRUD handles for the API collections

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use super::{ClientError, FormPart, Gateway, RequestOptions};
use crate::types::{
    Batch, MovementKind, NewBatch, NewMovement, NewProduct, NewRole, NewUser, NewWarehouse,
    Product, Role, StockMovement, TransferRequest, User, Warehouse,
};

/// CRUD handle over `/{collection}` and `/{collection}/{id}`
pub struct Resource<T, N> {
    gateway: Gateway,
    collection: &'static str,
    _marker: PhantomData<fn() -> (T, N)>,
}

impl<T, N> Clone for Resource<T, N> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            collection: self.collection,
            _marker: PhantomData,
        }
    }
}

impl<T, N> Resource<T, N>
where
    T: DeserializeOwned,
    N: Serialize,
{
    pub(crate) const fn new(gateway: Gateway, collection: &'static str) -> Self {
        Self {
            gateway,
            collection,
            _marker: PhantomData,
        }
    }

    fn collection_path(&self) -> String {
        format!("/{}", self.collection)
    }

    fn item_path(&self, id: &str) -> String {
        format!("/{}/{}", self.collection, id)
    }

    /// List every item
    pub async fn list(&self) -> Result<Vec<T>, ClientError> {
        self.list_with(RequestOptions::new()).await
    }

    /// List items with filters or other request options
    pub async fn list_with(&self, options: RequestOptions) -> Result<Vec<T>, ClientError> {
        self.gateway
            .execute(Method::GET, &self.collection_path(), options)
            .await
    }

    /// Fetch one item
    pub async fn get(&self, id: &str) -> Result<T, ClientError> {
        self.gateway
            .execute(Method::GET, &self.item_path(id), RequestOptions::new())
            .await
    }

    /// Create an item
    pub async fn create(&self, item: &N) -> Result<T, ClientError> {
        let options = RequestOptions::new().json(serde_json::to_value(item)?);
        self.gateway
            .execute(Method::POST, &self.collection_path(), options)
            .await
    }

    /// Replace an item
    pub async fn update(&self, id: &str, item: &N) -> Result<T, ClientError> {
        let options = RequestOptions::new().json(serde_json::to_value(item)?);
        self.gateway
            .execute(Method::PUT, &self.item_path(id), options)
            .await
    }

    /// Delete an item
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.gateway
            .execute_empty(Method::DELETE, &self.item_path(id), RequestOptions::new())
            .await
    }
}

/// Product catalog
impl Resource<Product, NewProduct> {
    /// Upload a product image as `multipart/form-data`
    pub async fn upload_image(
        &self,
        id: &str,
        file_name: &str,
        mime: &str,
        bytes: impl Into<Bytes>,
    ) -> Result<Product, ClientError> {
        let options = RequestOptions::new()
            .multipart(vec![FormPart::file("image", file_name, bytes).mime(mime)]);
        self.gateway
            .execute(Method::POST, &format!("{}/image", self.item_path(id)), options)
            .await
    }
}

/// Stock movements
impl Resource<StockMovement, NewMovement> {
    /// Move stock between warehouses; the API records both legs as one movement
    pub async fn transfer(&self, request: &TransferRequest) -> Result<StockMovement, ClientError> {
        let options = RequestOptions::new().json(serde_json::to_value(request)?);
        self.gateway
            .execute(Method::POST, &format!("{}/transfer", self.collection_path()), options)
            .await
    }

    /// List movements of one kind
    pub async fn list_kind(&self, kind: MovementKind) -> Result<Vec<StockMovement>, ClientError> {
        let kind = serde_json::to_value(kind)?;
        let kind = kind.as_str().unwrap_or_default().to_string();
        self.list_with(RequestOptions::new().query("kind", kind))
            .await
    }
}

impl Gateway {
    pub fn products(&self) -> Resource<Product, NewProduct> {
        Resource::new(self.clone(), "products")
    }

    pub fn batches(&self) -> Resource<Batch, NewBatch> {
        Resource::new(self.clone(), "batches")
    }

    pub fn warehouses(&self) -> Resource<Warehouse, NewWarehouse> {
        Resource::new(self.clone(), "warehouses")
    }

    pub fn movements(&self) -> Resource<StockMovement, NewMovement> {
        Resource::new(self.clone(), "movements")
    }

    pub fn users(&self) -> Resource<User, NewUser> {
        Resource::new(self.clone(), "users")
    }

    pub fn roles(&self) -> Resource<Role, NewRole> {
        Resource::new(self.clone(), "roles")
    }
}
