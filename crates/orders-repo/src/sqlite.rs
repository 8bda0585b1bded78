use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use orders_types::domain::identity::Identity;
use orders_types::domain::order::{Order, OrderChanges};
use orders_types::domain::order_item::{OrderItem, OrderItemChanges};
use orders_types::ports::identity_repository::IdentityRepository;
use orders_types::ports::order_item_repository::OrderItemRepository;
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

const MIGRATIONS: [&str; 4] = [
    include_str!("../migrations/0001_create_orders.sql"),
    include_str!("../migrations/0002_create_order_items.sql"),
    include_str!("../migrations/0003_index_order_items_order_id.sql"),
    include_str!("../migrations/0004_create_identities.sql"),
];

const ORDER_COLUMNS: &str = "id, order_number, customer_name, order_date, total_amount";
const ITEM_COLUMNS: &str = "id, order_id, product_name, quantity, unit_price, total_price";
const IDENTITY_COLUMNS: &str = "id, person_name, username, email, phone, password_hash, \
     refresh_token, refresh_token_expiration, created_at";

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn to_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_id(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(db_err)
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    order_number: String,
    customer_name: String,
    order_date: String,
    total_amount: i64,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        Ok(Order {
            id: parse_id(&self.id)?,
            order_number: self.order_number,
            customer_name: self.customer_name,
            order_date: parse_time(&self.order_date)?,
            total_amount: self.total_amount,
        })
    }
}

#[derive(FromRow)]
struct DbOrderItem {
    id: String,
    order_id: String,
    product_name: String,
    quantity: i64,
    unit_price: i64,
    total_price: i64,
}

impl DbOrderItem {
    fn into_item(self) -> Result<OrderItem, RepoError> {
        Ok(OrderItem {
            id: parse_id(&self.id)?,
            order_id: parse_id(&self.order_id)?,
            product_name: self.product_name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
        })
    }
}

#[derive(FromRow)]
struct DbIdentity {
    id: String,
    person_name: String,
    username: String,
    email: String,
    phone: String,
    password_hash: String,
    refresh_token: Option<String>,
    refresh_token_expiration: Option<String>,
    created_at: String,
}

impl DbIdentity {
    fn into_identity(self) -> Result<Identity, RepoError> {
        let refresh_token_expiration = self
            .refresh_token_expiration
            .as_deref()
            .map(parse_time)
            .transpose()?;
        Ok(Identity {
            id: parse_id(&self.id)?,
            person_name: self.person_name,
            username: self.username,
            email: self.email,
            phone: self.phone,
            password_hash: self.password_hash,
            refresh_token: self.refresh_token,
            refresh_token_expiration,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        sqlx::query(
            "INSERT INTO orders (id, order_number, customer_name, order_date, total_amount)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(&order.order_number)
        .bind(&order.customer_name)
        .bind(to_text(order.order_date))
        .bind(order.total_amount)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(DbOrder::into_order)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update(&self, id: Uuid, changes: OrderChanges) -> Result<Option<Order>, RepoError> {
        let updated =
            sqlx::query("UPDATE orders SET customer_name = ?, total_amount = ? WHERE id = ?")
                .bind(&changes.customer_name)
                .bind(changes.total_amount)
                .bind(id.to_string())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderItemRepository for SqliteRepo {
    async fn create_item(&self, item: OrderItem) -> Result<OrderItem, RepoError> {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_name, quantity, unit_price, total_price)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(item.order_id.to_string())
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(item)
    }

    async fn get_item(&self, order_id: Uuid, id: Uuid) -> Result<Option<OrderItem>, RepoError> {
        let row: Option<DbOrderItem> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? AND id = ?"
        ))
        .bind(order_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbOrderItem::into_item).transpose()
    }

    async fn list_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepoError> {
        let rows: Vec<DbOrderItem> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY product_name, id"
        ))
        .bind(order_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(DbOrderItem::into_item)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_item(
        &self,
        order_id: Uuid,
        id: Uuid,
        changes: OrderItemChanges,
    ) -> Result<Option<OrderItem>, RepoError> {
        let Some(mut item) = self.get_item(order_id, id).await? else {
            return Ok(None);
        };
        item.apply(&changes);
        let updated = sqlx::query(
            "UPDATE order_items SET product_name = ?, quantity = ?, unit_price = ?, total_price = ?
             WHERE order_id = ? AND id = ?",
        )
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .bind(order_id.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(item))
    }

    async fn delete_item(&self, order_id: Uuid, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM order_items WHERE order_id = ? AND id = ?")
            .bind(order_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl IdentityRepository for SqliteRepo {
    async fn create_identity(&self, identity: Identity) -> Result<Identity, RepoError> {
        sqlx::query(&format!(
            "INSERT INTO identities ({IDENTITY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(identity.id.to_string())
        .bind(&identity.person_name)
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(&identity.phone)
        .bind(&identity.password_hash)
        .bind(&identity.refresh_token)
        .bind(identity.refresh_token_expiration.map(to_text))
        .bind(to_text(identity.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepoError::Conflict(format!(
                    "username {} or email {} is already registered",
                    identity.username, identity.email
                ))
            }
            other => db_err(other),
        })?;
        Ok(identity)
    }

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>, RepoError> {
        let row: Option<DbIdentity> = sqlx::query_as(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbIdentity::into_identity).transpose()
    }

    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, RepoError> {
        // `username` is declared COLLATE NOCASE.
        let row: Option<DbIdentity> = sqlx::query_as(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(DbIdentity::into_identity).transpose()
    }

    async fn update_identity(&self, identity: Identity) -> Result<Option<Identity>, RepoError> {
        let updated = sqlx::query(
            "UPDATE identities SET person_name = ?, phone = ?, password_hash = ?,
             refresh_token = ?, refresh_token_expiration = ? WHERE id = ?",
        )
        .bind(&identity.person_name)
        .bind(&identity.phone)
        .bind(&identity.password_hash)
        .bind(&identity.refresh_token)
        .bind(identity.refresh_token_expiration.map(to_text))
        .bind(identity.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_identity_by_id(identity.id).await
    }
}
