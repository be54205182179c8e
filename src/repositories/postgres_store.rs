//! Almacén PostgreSQL
//!
//! Consultas parametrizadas con SQLx. Las operaciones de entrada y salida se
//! ejecutan dentro de una `Transaction` con bloqueo de fila (`FOR UPDATE`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::{
    SessionRepository, SpotRepository, StoreError, StoreResult, Transactional, UserRepository,
    VehicleRepository,
};
use crate::models::{
    ActiveSession, EntryDateRange, NewSession, NewUser, OccupancySummary, ParkingSession,
    ParkingSpot, SessionRecord, SessionSearch, User, Vehicle,
};

const SESSION_RECORD_COLUMNS: &str = r#"
    SELECT ps.id, v.license_plate, v.vehicle_type, ps.entry_time,
           ps.exit_time, ps.total_fee, ps.spot_number
    FROM parking_sessions ps
    JOIN vehicles v ON ps.vehicle_id = v.id
"#;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: role
            .parse()
            .map_err(|e| StoreError::Integrity(format!("user row: {}", e)))?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Transactional for PostgresStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl VehicleRepository for PostgresStore {
    async fn find_vehicle(
        &self,
        tx: &mut Self::Tx,
        license_plate: &str,
    ) -> StoreResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "SELECT id, license_plate, vehicle_type, created_at FROM vehicles WHERE license_plate = $1",
        )
        .bind(license_plate)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(vehicle)
    }

    async fn create_vehicle(
        &self,
        tx: &mut Self::Tx,
        license_plate: &str,
        vehicle_type: &str,
    ) -> StoreResult<Vehicle> {
        // El DO UPDATE vacío hace que RETURNING devuelva también la fila existente
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (license_plate, vehicle_type)
            VALUES ($1, $2)
            ON CONFLICT (license_plate) DO UPDATE SET license_plate = EXCLUDED.license_plate
            RETURNING id, license_plate, vehicle_type, created_at
            "#,
        )
        .bind(license_plate)
        .bind(vehicle_type)
        .fetch_one(&mut **tx)
        .await?;

        Ok(vehicle)
    }
}

#[async_trait]
impl SpotRepository for PostgresStore {
    async fn lock_spot(
        &self,
        tx: &mut Self::Tx,
        spot_number: i32,
    ) -> StoreResult<Option<ParkingSpot>> {
        let spot = sqlx::query_as::<_, ParkingSpot>(
            "SELECT spot_number, is_occupied FROM parking_spots WHERE spot_number = $1 FOR UPDATE",
        )
        .bind(spot_number)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(spot)
    }

    async fn set_spot_occupied(
        &self,
        tx: &mut Self::Tx,
        spot_number: i32,
        occupied: bool,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE parking_spots SET is_occupied = $2 WHERE spot_number = $1")
            .bind(spot_number)
            .bind(occupied)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Integrity(format!(
                "spot {} disappeared during the transaction",
                spot_number
            )));
        }
        Ok(())
    }

    async fn provision_spots(&self, count: i32) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO parking_spots (spot_number)
            SELECT generate_series(1, $1)
            ON CONFLICT (spot_number) DO NOTHING
            "#,
        )
        .bind(count)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_spots(&self) -> StoreResult<Vec<ParkingSpot>> {
        let spots = sqlx::query_as::<_, ParkingSpot>(
            "SELECT spot_number, is_occupied FROM parking_spots ORDER BY spot_number",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(spots)
    }

    async fn occupancy(&self) -> StoreResult<OccupancySummary> {
        let (total, occupied, active): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM parking_spots),
                (SELECT COUNT(*) FROM parking_spots WHERE is_occupied),
                (SELECT COUNT(*) FROM parking_sessions WHERE exit_time IS NULL)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(OccupancySummary::new(total, occupied, active))
    }
}

#[async_trait]
impl SessionRepository for PostgresStore {
    async fn insert_session(
        &self,
        tx: &mut Self::Tx,
        session: NewSession,
    ) -> StoreResult<ParkingSession> {
        let session = sqlx::query_as::<_, ParkingSession>(
            r#"
            INSERT INTO parking_sessions (vehicle_id, entry_time, spot_number)
            VALUES ($1, $2, $3)
            RETURNING id, vehicle_id, entry_time, exit_time, total_fee, spot_number
            "#,
        )
        .bind(session.vehicle_id)
        .bind(session.entry_time)
        .bind(session.spot_number)
        .fetch_one(&mut **tx)
        .await?;

        Ok(session)
    }

    async fn lock_active_session(
        &self,
        tx: &mut Self::Tx,
        license_plate: &str,
    ) -> StoreResult<Option<ActiveSession>> {
        let session = sqlx::query_as::<_, ActiveSession>(
            r#"
            SELECT ps.id AS session_id, v.license_plate, v.vehicle_type,
                   ps.entry_time, ps.spot_number
            FROM parking_sessions ps
            JOIN vehicles v ON ps.vehicle_id = v.id
            WHERE v.license_plate = $1 AND ps.exit_time IS NULL
            ORDER BY ps.entry_time DESC, ps.id DESC
            LIMIT 1
            FOR UPDATE OF ps
            "#,
        )
        .bind(license_plate)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(session)
    }

    async fn close_session(
        &self,
        tx: &mut Self::Tx,
        session_id: i64,
        exit_time: DateTime<Utc>,
        total_fee: Decimal,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE parking_sessions
            SET exit_time = $2, total_fee = $3
            WHERE id = $1 AND exit_time IS NULL
            "#,
        )
        .bind(session_id)
        .bind(exit_time)
        .bind(total_fee)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_active_sessions(&self) -> StoreResult<Vec<SessionRecord>> {
        let query = format!(
            "{} WHERE ps.exit_time IS NULL ORDER BY ps.entry_time DESC, ps.id DESC",
            SESSION_RECORD_COLUMNS
        );
        let sessions = sqlx::query_as::<_, SessionRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    async fn search_sessions(&self, search: &SessionSearch) -> StoreResult<Vec<SessionRecord>> {
        let query = format!(
            r#"{}
            WHERE ($1::text IS NULL OR v.license_plate = $1)
              AND ($2::bigint IS NULL OR ps.id = $2)
            ORDER BY ps.entry_time DESC, ps.id DESC
            LIMIT $3"#,
            SESSION_RECORD_COLUMNS
        );
        let sessions = sqlx::query_as::<_, SessionRecord>(&query)
            .bind(search.license_plate.as_deref())
            .bind(search.session_id)
            .bind(search.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }

    async fn sessions_by_entry_date(
        &self,
        range: &EntryDateRange,
    ) -> StoreResult<Vec<SessionRecord>> {
        let query = format!(
            r#"{}
            WHERE ($1::date IS NULL OR (ps.entry_time AT TIME ZONE 'UTC')::date >= $1)
              AND ($2::date IS NULL OR (ps.entry_time AT TIME ZONE 'UTC')::date <= $2)
            ORDER BY ps.entry_time DESC, ps.id DESC"#,
            SESSION_RECORD_COLUMNS
        );
        let sessions = sqlx::query_as::<_, SessionRecord>(&query)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        sqlx::query(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(user_from_row)
        .transpose()
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        sqlx::query("SELECT id, username, password_hash, role, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(user_from_row)
            .transpose()
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>> {
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, password_hash, role, created_at
            "#,
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(user_from_row)
        .transpose()
    }
}
