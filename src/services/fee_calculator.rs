//! Cálculo de tarifas
//!
//! Función pura: horas facturadas (redondeadas hacia arriba) por la tarifa
//! horaria del tipo de vehículo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::VehicleType;

const MILLIS_PER_HOUR: i64 = 3_600_000;

#[derive(Debug, Error, PartialEq)]
pub enum FeeError {
    #[error("exit time {exit} precedes entry time {entry}")]
    NegativeDuration {
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
    },
}

impl VehicleType {
    /// Tarifa por hora
    pub fn hourly_rate(&self) -> Decimal {
        match self {
            VehicleType::Bike => Decimal::from(10),
            VehicleType::Car => Decimal::from(20),
            VehicleType::Truck => Decimal::from(40),
        }
    }
}

/// Horas facturadas: cualquier fracción cuenta como hora completa, duración cero son 0 horas
pub fn billed_hours(entry: DateTime<Utc>, exit: DateTime<Utc>) -> Result<i64, FeeError> {
    let millis = (exit - entry).num_milliseconds();
    if millis < 0 {
        return Err(FeeError::NegativeDuration { entry, exit });
    }
    Ok((millis + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR)
}

pub fn calculate_fee(
    entry: DateTime<Utc>,
    exit: DateTime<Utc>,
    vehicle_type: &str,
) -> Result<Decimal, FeeError> {
    let hours = billed_hours(entry, exit)?;
    Ok(Decimal::from(hours) * VehicleType::from_label(vehicle_type).hourly_rate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, h, m, s).unwrap()
    }

    #[test]
    fn test_car_ninety_minutes_bills_two_hours() {
        assert_eq!(calculate_fee(at(10, 0, 0), at(11, 30, 0), "car").unwrap(), Decimal::from(40));
    }

    #[test]
    fn test_zero_duration_is_free() {
        assert_eq!(billed_hours(at(10, 0, 0), at(10, 0, 0)).unwrap(), 0);
        assert_eq!(calculate_fee(at(10, 0, 0), at(10, 0, 0), "truck").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_duration_fails() {
        let err = calculate_fee(at(10, 0, 0), at(9, 59, 0), "car").unwrap_err();
        assert_eq!(
            err,
            FeeError::NegativeDuration {
                entry: at(10, 0, 0),
                exit: at(9, 59, 0)
            }
        );
    }

    #[test]
    fn test_one_second_past_the_hour_bills_next_hour() {
        assert_eq!(billed_hours(at(10, 0, 0), at(11, 0, 0)).unwrap(), 1);
        assert_eq!(billed_hours(at(10, 0, 0), at(11, 0, 1)).unwrap(), 2);
        assert_eq!(billed_hours(at(10, 0, 0), at(10, 0, 1)).unwrap(), 1);
    }

    #[test]
    fn test_rates_by_vehicle_type() {
        let entry = at(8, 0, 0);
        let exit = entry + Duration::hours(3);

        assert_eq!(calculate_fee(entry, exit, "bike").unwrap(), Decimal::from(30));
        assert_eq!(calculate_fee(entry, exit, "car").unwrap(), Decimal::from(60));
        assert_eq!(calculate_fee(entry, exit, "truck").unwrap(), Decimal::from(120));
        assert_eq!(calculate_fee(entry, exit, "van").unwrap(), Decimal::from(60));
    }

    #[test]
    fn test_multi_day_stay() {
        let entry = at(8, 0, 0);
        let exit = entry + Duration::hours(49) + Duration::minutes(1);
        assert_eq!(calculate_fee(entry, exit, "bike").unwrap(), Decimal::from(500));
    }
}
