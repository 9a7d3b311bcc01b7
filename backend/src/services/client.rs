//! Client directory service

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, AppResult};

/// Client management service
#[derive(Clone)]
pub struct ClientService {
    db: PgPool,
}

/// Client record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientView {
    pub client_id: i64,
    pub client_name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Input for creating or updating a client
#[derive(Debug, Deserialize)]
pub struct ClientInput {
    pub client_name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl ClientService {
    /// Create a new ClientService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_client(&self, input: ClientInput) -> AppResult<ClientView> {
        if input.client_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "client_name".to_string(),
                message: "Client name is required".to_string(),
            });
        }

        let client = sqlx::query_as::<_, ClientView>(
            r#"
            INSERT INTO clients (client_name, contact_person, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING client_id, client_name, contact_person, phone, email, address
            "#,
        )
        .bind(input.client_name.trim())
        .bind(&input.contact_person)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;
        Ok(client)
    }

    pub async fn get_client(&self, client_id: i64) -> AppResult<ClientView> {
        sqlx::query_as::<_, ClientView>(
            r#"
            SELECT client_id, client_name, contact_person, phone, email, address
            FROM clients
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))
    }

    pub async fn list_clients(&self) -> AppResult<Vec<ClientView>> {
        let clients = sqlx::query_as::<_, ClientView>(
            r#"
            SELECT client_id, client_name, contact_person, phone, email, address
            FROM clients
            ORDER BY client_name
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(clients)
    }

    pub async fn update_client(&self, client_id: i64, input: ClientInput) -> AppResult<ClientView> {
        sqlx::query_as::<_, ClientView>(
            r#"
            UPDATE clients
            SET client_name = $1, contact_person = $2, phone = $3, email = $4, address = $5
            WHERE client_id = $6
            RETURNING client_id, client_name, contact_person, phone, email, address
            "#,
        )
        .bind(input.client_name.trim())
        .bind(&input.contact_person)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(client_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))
    }

    /// Delete a client. Blocked while any piece still references them.
    pub async fn delete_client(&self, client_id: i64) -> AppResult<()> {
        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM pieces WHERE client_id = $1)",
        )
        .bind(client_id)
        .fetch_one(&self.db)
        .await?;
        if referenced {
            return Err(AppError::Validation {
                field: "client_id".to_string(),
                message: "Client has stock movements and cannot be deleted".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM clients WHERE client_id = $1")
            .bind(client_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Client".to_string()));
        }
        Ok(())
    }
}
