use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

use crate::error::TripError;
use crate::place::Place;
use crate::user::UserPublic;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: i64,
    pub owner_id: i64,
    pub collaborator_ids: Vec<i64>,
    pub member_ids: Vec<i64>,
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub places: Vec<Place>,
    // Strictly greater than every place id ever issued for this trip.
    pub next_place_id: i64,
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for Trip {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let collaborator_blob: Vec<u8> = row.get(2);
        let member_blob: Vec<u8> = row.get(3);
        let place_blob: Vec<u8> = row.get(8);

        Ok(Self {
            trip_id: row.get(0),
            owner_id: row.get(1),
            collaborator_ids: decode_id_list(&collaborator_blob)?,
            member_ids: decode_id_list(&member_blob)?,
            title: row.get(4),
            description: row.get(5),
            start_date: row.get(6),
            end_date: row.get(7),
            places: decode_places(&place_blob)?,
            next_place_id: row.get(9),
        })
    }
}

#[cfg(feature = "sqlx")]
fn decode_id_list(blob: &[u8]) -> sqlx::Result<Vec<i64>> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }
    bincode::deserialize(blob).map_err(|err| sqlx::Error::Decode(err))
}

#[cfg(feature = "sqlx")]
fn decode_places(blob: &[u8]) -> sqlx::Result<Vec<Place>> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }
    bincode::deserialize(blob).map_err(|err| sqlx::Error::Decode(err))
}

impl Trip {
    pub fn new(trip_id: i64, owner_id: i64, title: String, description: String, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            trip_id,
            owner_id,
            collaborator_ids: Vec::new(),
            member_ids: Vec::new(),
            title,
            description,
            start_date,
            end_date,
            places: Vec::new(),
            next_place_id: 1,
        }
    }

    pub fn collaborator_ids_blob(&self) -> Vec<u8> {
        bincode::serialize(&self.collaborator_ids).unwrap()
    }

    pub fn member_ids_blob(&self) -> Vec<u8> {
        bincode::serialize(&self.member_ids).unwrap()
    }

    pub fn places_blob(&self) -> Vec<u8> {
        bincode::serialize(&self.places).unwrap()
    }

    /// Merges the patch into the trip metadata. Requires membership-management
    /// rights. The merged date range must satisfy start <= end.
    pub fn update_details(&mut self, actor: &UserPublic, patch: TripPatch) -> Result<(), TripError> {
        if !self.can_manage_membership(actor) {
            return Err(TripError::Unauthorized);
        }

        let start_date = patch.start_date.or(self.start_date);
        let end_date = patch.end_date.or(self.end_date);
        check_date_range(start_date, end_date)?;

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        self.start_date = start_date;
        self.end_date = end_date;

        Ok(())
    }
}

/// Fields absent from the patch keep their current value.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TripPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn check_date_range(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Result<(), TripError> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(TripError::Validation("start date must not be after end date".to_string()));
        }
    }
    Ok(())
}
