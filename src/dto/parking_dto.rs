use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::services::parking_service::{EntryCommand, EntryReceipt, ExitReceipt};

// Request de entrada de un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct EntryRequest {
    #[validate(length(max = 20, message = "license_plate must be at most 20 characters"))]
    pub license_plate: Option<String>,
    #[validate(length(max = 20, message = "vehicle_type must be at most 20 characters"))]
    pub vehicle_type: Option<String>,
    /// Número o texto numérico (los formularios envían `"2"`); texto vacío equivale a ausente
    #[serde(default, deserialize_with = "spot_number_from_number_or_text")]
    #[validate(range(min = 1, message = "spot_number must be positive"))]
    pub spot_number: Option<i32>,
}

fn spot_number_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSpotNumber {
        Number(i64),
        Text(String),
    }

    let number = match Option::<RawSpotNumber>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawSpotNumber::Number(number)) => number,
        Some(RawSpotNumber::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<i64>()
                .map_err(|_| serde::de::Error::custom("spot_number must be an integer"))?
        }
    };

    i32::try_from(number)
        .map(Some)
        .map_err(|_| serde::de::Error::custom("spot_number is out of range"))
}

impl From<EntryRequest> for EntryCommand {
    fn from(request: EntryRequest) -> Self {
        Self {
            license_plate: request.license_plate,
            vehicle_type: request.vehicle_type,
            spot_number: request.spot_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub message: String,
    pub entry_time: DateTime<Utc>,
    pub session_id: i64,
}

impl From<EntryReceipt> for EntryResponse {
    fn from(receipt: EntryReceipt) -> Self {
        Self {
            message: "Vehicle entry recorded".to_string(),
            entry_time: receipt.entry_time,
            session_id: receipt.session_id,
        }
    }
}

// Request de salida
#[derive(Debug, Deserialize, Validate)]
pub struct ExitRequest {
    #[validate(length(max = 20, message = "license_plate must be at most 20 characters"))]
    pub license_plate: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExitResponse {
    pub message: String,
    pub exit_time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_fee: Decimal,
    pub spot_number: i32,
    pub session_id: i64,
}

impl From<ExitReceipt> for ExitResponse {
    fn from(receipt: ExitReceipt) -> Self {
        Self {
            message: "Vehicle exit recorded".to_string(),
            exit_time: receipt.exit_time,
            total_fee: receipt.total_fee,
            spot_number: receipt.spot_number,
            session_id: receipt.session_id,
        }
    }
}
