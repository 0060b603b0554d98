use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TripError;
use crate::trip::Trip;
use crate::user::UserPublic;

/// An itinerary entry. Owned by its parent trip; the id is unique within
/// that trip only.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Place {
    pub place_id: i64,
    pub location_name: String,
    pub notes: Option<String>,
    pub day_number: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewPlace {
    pub location_name: String,
    pub notes: Option<String>,
    pub day_number: u32,
}

/// Fields absent from the patch keep their current value.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PlacePatch {
    pub location_name: Option<String>,
    pub notes: Option<String>,
    pub day_number: Option<u32>,
}

fn check_day_number(day_number: u32) -> Result<(), TripError> {
    if day_number < 1 {
        return Err(TripError::Validation("day number must be at least 1".to_string()));
    }
    Ok(())
}

impl Trip {
    /// Appends a place with the next id from this trip's counter.
    pub fn add_place(&mut self, actor: &UserPublic, data: NewPlace) -> Result<Place, TripError> {
        if !self.can_manage_content(actor) {
            return Err(TripError::Unauthorized);
        }
        check_day_number(data.day_number)?;

        let place = Place {
            place_id: self.next_place_id,
            location_name: data.location_name,
            notes: data.notes,
            day_number: data.day_number,
        };
        self.next_place_id += 1;
        self.places.push(place.clone());

        Ok(place)
    }

    pub fn update_place(&mut self, actor: &UserPublic, place_id: i64, patch: PlacePatch) -> Result<Place, TripError> {
        if !self.can_manage_content(actor) {
            return Err(TripError::Unauthorized);
        }
        if let Some(day_number) = patch.day_number {
            check_day_number(day_number)?;
        }

        let place = self
            .places
            .iter_mut()
            .find(|place| place.place_id == place_id)
            .ok_or(TripError::PlaceNotFound)?;

        if let Some(location_name) = patch.location_name {
            place.location_name = location_name;
        }
        if let Some(notes) = patch.notes {
            place.notes = Some(notes);
        }
        if let Some(day_number) = patch.day_number {
            place.day_number = day_number;
        }

        Ok(place.clone())
    }

    pub fn delete_place(&mut self, actor: &UserPublic, place_id: i64) -> Result<(), TripError> {
        if !self.can_manage_content(actor) {
            return Err(TripError::Unauthorized);
        }

        let before = self.places.len();
        self.places.retain(|place| place.place_id != place_id);
        if self.places.len() == before {
            return Err(TripError::PlaceNotFound);
        }

        Ok(())
    }
}

/// Places ordered by day number; same-day entries keep their insertion order.
pub fn sorted_by_day(places: &[Place]) -> Vec<Place> {
    let mut sorted = places.to_vec();
    // Vec::sort_by_key is stable, which the same-day ordering relies on.
    sorted.sort_by_key(|place| place.day_number);
    sorted
}

/// Groups the itinerary into an ordered day -> places mapping.
pub fn group_by_day(places: &[Place]) -> BTreeMap<u32, Vec<Place>> {
    let mut by_day: BTreeMap<u32, Vec<Place>> = BTreeMap::new();
    for place in sorted_by_day(places) {
        by_day.entry(place.day_number).or_default().push(place);
    }
    by_day
}
