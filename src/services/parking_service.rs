//! Ciclo de vida de las sesiones de aparcamiento
//!
//! La entrada abre una sesión y ocupa la plaza; la salida cierra la sesión
//! activa más reciente de la matrícula, calcula la tarifa y libera la plaza.
//! Cada operación es una única transacción del almacén.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{normalize_license_plate, normalize_vehicle_type, NewSession};
use crate::repositories::{ParkingStore, StoreError};
use crate::services::fee_calculator::{calculate_fee, FeeError};
use crate::utils::Clock;

#[derive(Debug, Error)]
pub enum ParkingError {
    #[error("license_plate is required")]
    MissingLicensePlate,

    #[error("spot_number is required")]
    MissingSpotNumber,

    #[error("Invalid spot number: {0}")]
    SpotNotFound(i32),

    #[error("Spot {0} already occupied")]
    SpotOccupied(i32),

    #[error("No active session for vehicle {0}")]
    NoActiveSession(String),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Datos de entrada tal como llegan del encargado
#[derive(Debug, Clone, Default)]
pub struct EntryCommand {
    pub license_plate: Option<String>,
    pub vehicle_type: Option<String>,
    pub spot_number: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryReceipt {
    pub session_id: i64,
    pub license_plate: String,
    pub spot_number: i32,
    pub entry_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitReceipt {
    pub session_id: i64,
    pub license_plate: String,
    pub spot_number: i32,
    pub exit_time: DateTime<Utc>,
    pub total_fee: Decimal,
}

pub struct ParkingService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: ParkingStore> ParkingService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Registrar la entrada de un vehículo en una plaza libre
    pub async fn record_entry(&self, command: EntryCommand) -> Result<EntryReceipt, ParkingError> {
        let license_plate = command
            .license_plate
            .as_deref()
            .and_then(normalize_license_plate)
            .ok_or(ParkingError::MissingLicensePlate)?;
        let spot_number = command.spot_number.ok_or(ParkingError::MissingSpotNumber)?;
        let vehicle_type = normalize_vehicle_type(command.vehicle_type.as_deref());

        let mut tx = self.store.begin().await?;

        let spot = self
            .store
            .lock_spot(&mut tx, spot_number)
            .await?
            .ok_or(ParkingError::SpotNotFound(spot_number))?;
        if spot.is_occupied {
            return Err(ParkingError::SpotOccupied(spot_number));
        }

        let vehicle = match self.store.find_vehicle(&mut tx, &license_plate).await? {
            Some(vehicle) => vehicle,
            None => {
                debug!("🚗 Nuevo vehículo {} ({})", license_plate, vehicle_type);
                self.store
                    .create_vehicle(&mut tx, &license_plate, &vehicle_type)
                    .await?
            }
        };

        let entry_time = self.clock.now();
        let session = self
            .store
            .insert_session(
                &mut tx,
                NewSession {
                    vehicle_id: vehicle.id,
                    spot_number,
                    entry_time,
                },
            )
            .await?;
        self.store.set_spot_occupied(&mut tx, spot_number, true).await?;
        self.store.commit(tx).await?;

        info!(
            "🅿️ Entrada registrada: {} en plaza {} (sesión {})",
            license_plate, spot_number, session.id
        );

        Ok(EntryReceipt {
            session_id: session.id,
            license_plate,
            spot_number,
            entry_time,
        })
    }

    /// Registrar la salida: cierra la sesión activa más reciente y libera la plaza
    pub async fn record_exit(&self, license_plate: Option<&str>) -> Result<ExitReceipt, ParkingError> {
        let license_plate = license_plate
            .and_then(normalize_license_plate)
            .ok_or(ParkingError::MissingLicensePlate)?;

        let mut tx = self.store.begin().await?;

        let active = self
            .store
            .lock_active_session(&mut tx, &license_plate)
            .await?
            .ok_or_else(|| ParkingError::NoActiveSession(license_plate.clone()))?;

        let exit_time = self.clock.now();
        let total_fee = calculate_fee(active.entry_time, exit_time, &active.vehicle_type)?;

        if !self
            .store
            .close_session(&mut tx, active.session_id, exit_time, total_fee)
            .await?
        {
            return Err(ParkingError::NoActiveSession(license_plate));
        }
        self.store
            .set_spot_occupied(&mut tx, active.spot_number, false)
            .await?;
        self.store.commit(tx).await?;

        info!(
            "🚙 Salida registrada: {} de plaza {} ({} €)",
            license_plate, active.spot_number, total_fee
        );

        Ok(ExitReceipt {
            session_id: active.session_id,
            license_plate,
            spot_number: active.spot_number,
            exit_time,
            total_fee,
        })
    }

    /// Crear las plazas que falten hasta `count`
    pub async fn provision_spots(&self, count: i32) -> Result<u64, ParkingError> {
        let created = self.store.provision_spots(count).await?;
        if created > 0 {
            info!("🅿️ {} plazas nuevas creadas (total configurado: {})", created, count);
        }
        Ok(created)
    }
}
