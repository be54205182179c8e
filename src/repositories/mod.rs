//! Acceso a datos
//!
//! Un trait por entidad (vehículos, plazas, sesiones, usuarios) más una frontera
//! transaccional. La lógica de negocio solo conoce estos traits; `PostgresStore`
//! y `MemoryStore` los implementan.

pub mod memory_store;
pub mod postgres_store;

pub use memory_store::MemoryStore;
pub use postgres_store::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    ActiveSession, EntryDateRange, NewSession, NewUser, OccupancySummary, ParkingSession,
    ParkingSpot, SessionRecord, SessionSearch, User, Vehicle,
};

/// Errores del almacenamiento
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Integrity error: {0}")]
    Integrity(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Frontera transaccional. Soltar una transacción sin `commit` la descarta.
#[async_trait]
pub trait Transactional: Send + Sync + 'static {
    type Tx: Send + 'static;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()>;
}

#[async_trait]
pub trait VehicleRepository: Transactional {
    async fn find_vehicle(&self, tx: &mut Self::Tx, license_plate: &str)
        -> StoreResult<Option<Vehicle>>;

    /// Si la matrícula ya existe devuelve la fila existente sin tocar su tipo
    async fn create_vehicle(
        &self,
        tx: &mut Self::Tx,
        license_plate: &str,
        vehicle_type: &str,
    ) -> StoreResult<Vehicle>;
}

#[async_trait]
pub trait SpotRepository: Transactional {
    /// Lee la plaza bloqueándola hasta el fin de la transacción
    async fn lock_spot(&self, tx: &mut Self::Tx, spot_number: i32)
        -> StoreResult<Option<ParkingSpot>>;

    async fn set_spot_occupied(
        &self,
        tx: &mut Self::Tx,
        spot_number: i32,
        occupied: bool,
    ) -> StoreResult<()>;

    /// Crea las plazas `1..=count` que falten; devuelve cuántas se crearon
    async fn provision_spots(&self, count: i32) -> StoreResult<u64>;

    async fn list_spots(&self) -> StoreResult<Vec<ParkingSpot>>;

    async fn occupancy(&self) -> StoreResult<OccupancySummary>;
}

#[async_trait]
pub trait SessionRepository: Transactional {
    async fn insert_session(&self, tx: &mut Self::Tx, session: NewSession)
        -> StoreResult<ParkingSession>;

    /// Sesión activa más reciente de la matrícula (entrada más tardía, luego id mayor), bloqueada
    async fn lock_active_session(
        &self,
        tx: &mut Self::Tx,
        license_plate: &str,
    ) -> StoreResult<Option<ActiveSession>>;

    /// Devuelve `false` si la sesión ya estaba cerrada
    async fn close_session(
        &self,
        tx: &mut Self::Tx,
        session_id: i64,
        exit_time: DateTime<Utc>,
        total_fee: Decimal,
    ) -> StoreResult<bool>;

    async fn list_active_sessions(&self) -> StoreResult<Vec<SessionRecord>>;

    async fn search_sessions(&self, search: &SessionSearch) -> StoreResult<Vec<SessionRecord>>;

    async fn sessions_by_entry_date(&self, range: &EntryDateRange)
        -> StoreResult<Vec<SessionRecord>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// `None` si el username ya existe
    async fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>>;
}

/// Todo lo que necesita la aplicación de un almacén
pub trait ParkingStore:
    VehicleRepository + SpotRepository + SessionRepository + UserRepository
{
}

impl<T> ParkingStore for T where
    T: VehicleRepository + SpotRepository + SessionRepository + UserRepository
{
}
