//! Almacén en memoria
//!
//! Mismo contrato que `PostgresStore`. Las transacciones toman el mutex de
//! forma exclusiva y trabajan sobre una copia; `commit` la publica y soltar la
//! transacción la descarta. Lo usan los tests y el arranque sin `DATABASE_URL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    SessionRepository, SpotRepository, StoreError, StoreResult, Transactional, UserRepository,
    VehicleRepository,
};
use crate::models::{
    ActiveSession, EntryDateRange, NewSession, NewUser, OccupancySummary, ParkingSession,
    ParkingSpot, SessionRecord, SessionSearch, User, Vehicle,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    vehicles: Vec<Vehicle>,
    spots: BTreeMap<i32, bool>,
    sessions: Vec<ParkingSession>,
    users: Vec<User>,
    next_vehicle_id: i64,
    next_session_id: i64,
    next_user_id: i64,
}

impl MemoryState {
    fn vehicle(&self, id: i64) -> StoreResult<&Vehicle> {
        self.vehicles
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| StoreError::Integrity(format!("session references missing vehicle {}", id)))
    }

    fn record(&self, session: &ParkingSession) -> StoreResult<SessionRecord> {
        let vehicle = self.vehicle(session.vehicle_id)?;
        Ok(SessionRecord {
            id: session.id,
            license_plate: vehicle.license_plate.clone(),
            vehicle_type: vehicle.vehicle_type.clone(),
            entry_time: session.entry_time,
            exit_time: session.exit_time,
            total_fee: session.total_fee,
            spot_number: session.spot_number,
        })
    }

    /// Registros que cumplen el filtro, entrada más reciente primero
    fn records_where<F>(&self, keep: F) -> StoreResult<Vec<SessionRecord>>
    where
        F: Fn(&SessionRecord) -> bool,
    {
        let mut records = Vec::new();
        for session in &self.sessions {
            let record = self.record(session)?;
            if keep(&record) {
                records.push(record);
            }
        }
        records.sort_by(|a, b| b.entry_time.cmp(&a.entry_time).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}

/// Transacción del almacén en memoria
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transactional for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTx { guard, staged })
    }

    async fn commit(&self, tx: Self::Tx) -> StoreResult<()> {
        let MemoryTx { mut guard, staged } = tx;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn find_vehicle(
        &self,
        tx: &mut Self::Tx,
        license_plate: &str,
    ) -> StoreResult<Option<Vehicle>> {
        Ok(tx
            .staged
            .vehicles
            .iter()
            .find(|v| v.license_plate == license_plate)
            .cloned())
    }

    async fn create_vehicle(
        &self,
        tx: &mut Self::Tx,
        license_plate: &str,
        vehicle_type: &str,
    ) -> StoreResult<Vehicle> {
        if let Some(existing) = self.find_vehicle(tx, license_plate).await? {
            return Ok(existing);
        }

        let state = &mut tx.staged;
        state.next_vehicle_id += 1;
        let vehicle = Vehicle {
            id: state.next_vehicle_id,
            license_plate: license_plate.to_string(),
            vehicle_type: vehicle_type.to_string(),
            created_at: Utc::now(),
        };
        state.vehicles.push(vehicle.clone());
        Ok(vehicle)
    }
}

#[async_trait]
impl SpotRepository for MemoryStore {
    async fn lock_spot(
        &self,
        tx: &mut Self::Tx,
        spot_number: i32,
    ) -> StoreResult<Option<ParkingSpot>> {
        Ok(tx
            .staged
            .spots
            .get(&spot_number)
            .map(|&is_occupied| ParkingSpot {
                spot_number,
                is_occupied,
            }))
    }

    async fn set_spot_occupied(
        &self,
        tx: &mut Self::Tx,
        spot_number: i32,
        occupied: bool,
    ) -> StoreResult<()> {
        match tx.staged.spots.get_mut(&spot_number) {
            Some(flag) => {
                *flag = occupied;
                Ok(())
            }
            None => Err(StoreError::Integrity(format!(
                "spot {} disappeared during the transaction",
                spot_number
            ))),
        }
    }

    async fn provision_spots(&self, count: i32) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut created = 0;
        for spot_number in 1..=count {
            if !state.spots.contains_key(&spot_number) {
                state.spots.insert(spot_number, false);
                created += 1;
            }
        }
        Ok(created)
    }

    async fn list_spots(&self) -> StoreResult<Vec<ParkingSpot>> {
        let state = self.state.lock().await;
        Ok(state
            .spots
            .iter()
            .map(|(&spot_number, &is_occupied)| ParkingSpot {
                spot_number,
                is_occupied,
            })
            .collect())
    }

    async fn occupancy(&self) -> StoreResult<OccupancySummary> {
        let state = self.state.lock().await;
        let total = state.spots.len() as i64;
        let occupied = state.spots.values().filter(|&&o| o).count() as i64;
        let active = state.sessions.iter().filter(|s| s.is_active()).count() as i64;
        Ok(OccupancySummary::new(total, occupied, active))
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert_session(
        &self,
        tx: &mut Self::Tx,
        session: NewSession,
    ) -> StoreResult<ParkingSession> {
        let state = &mut tx.staged;
        state.vehicle(session.vehicle_id)?;
        if state
            .sessions
            .iter()
            .any(|s| s.is_active() && s.spot_number == session.spot_number)
        {
            return Err(StoreError::Integrity(format!(
                "spot {} already has an active session",
                session.spot_number
            )));
        }

        state.next_session_id += 1;
        let row = ParkingSession {
            id: state.next_session_id,
            vehicle_id: session.vehicle_id,
            entry_time: session.entry_time,
            exit_time: None,
            total_fee: None,
            spot_number: session.spot_number,
        };
        state.sessions.push(row.clone());
        Ok(row)
    }

    async fn lock_active_session(
        &self,
        tx: &mut Self::Tx,
        license_plate: &str,
    ) -> StoreResult<Option<ActiveSession>> {
        let state = &tx.staged;
        let Some(vehicle) = state.vehicles.iter().find(|v| v.license_plate == license_plate) else {
            return Ok(None);
        };

        let latest = state
            .sessions
            .iter()
            .filter(|s| s.vehicle_id == vehicle.id && s.is_active())
            .max_by(|a, b| a.entry_time.cmp(&b.entry_time).then(a.id.cmp(&b.id)));

        Ok(latest.map(|s| ActiveSession {
            session_id: s.id,
            license_plate: vehicle.license_plate.clone(),
            vehicle_type: vehicle.vehicle_type.clone(),
            entry_time: s.entry_time,
            spot_number: s.spot_number,
        }))
    }

    async fn close_session(
        &self,
        tx: &mut Self::Tx,
        session_id: i64,
        exit_time: DateTime<Utc>,
        total_fee: Decimal,
    ) -> StoreResult<bool> {
        match tx
            .staged
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.is_active())
        {
            Some(session) => {
                session.exit_time = Some(exit_time);
                session.total_fee = Some(total_fee);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_active_sessions(&self) -> StoreResult<Vec<SessionRecord>> {
        let state = self.state.lock().await;
        state.records_where(|r| r.exit_time.is_none())
    }

    async fn search_sessions(&self, search: &SessionSearch) -> StoreResult<Vec<SessionRecord>> {
        let state = self.state.lock().await;
        let mut records = state.records_where(|r| {
            search
                .license_plate
                .as_deref()
                .map_or(true, |plate| r.license_plate == plate)
                && search.session_id.map_or(true, |id| r.id == id)
        })?;
        records.truncate(search.limit.max(0) as usize);
        Ok(records)
    }

    async fn sessions_by_entry_date(
        &self,
        range: &EntryDateRange,
    ) -> StoreResult<Vec<SessionRecord>> {
        let state = self.state.lock().await;
        state.records_where(|r| range.contains(&r.entry_time))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.username == user.username) {
            return Ok(None);
        }

        state.next_user_id += 1;
        let row = User {
            id: state.next_user_id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.push(row.clone());
        Ok(Some(row))
    }
}
