use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};
use trip_planner_lib::{
    error::TripError,
    membership::MembershipList,
    place::{self, NewPlace, Place, PlacePatch},
    trip::{check_date_range, Trip, TripPatch},
    user::{UserPublic, UserRole},
};

use crate::{database::db::TripDatabase, DataManagerError, DATA_DIR};

/// Hex-encoded SHA-256 digest, the stored form of every password.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[derive(Clone)]
pub struct DataManager {
    pub(crate) database: TripDatabase,
}

/// The public interface for all trip planner data management. Mutating trip
/// operations re-fetch the trip, apply the core rule, and write the full
/// document back.
impl DataManager {
    pub async fn start() -> Result<Self, DataManagerError> {
        // Create data dir if it doesn't exist
        let root: PathBuf = project_root::get_project_root()
            .map_err(|_| DataManagerError::Database("Failed to locate project root".to_string()))?;
        let data_dir = root.join(DATA_DIR);
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)
                .map_err(|_| DataManagerError::Database(format!("Failed to create data directory: {:?}", data_dir)))?;
        }

        let database = TripDatabase::connect().await?;

        Ok(DataManager { database })
    }

    /// Backed by an in-memory database. Nothing survives the pool.
    pub async fn start_in_memory() -> Result<Self, DataManagerError> {
        let database = TripDatabase::connect_in_memory().await?;
        Ok(DataManager { database })
    }

    // Accounts

    pub async fn register_user(&self, name: String, email: String, password: &str) -> Result<UserPublic, DataManagerError> {
        if self.database.get_user_by_email(&email).await?.is_some() {
            return Err(DataManagerError::EmailTaken);
        }

        let user = self.database
            .insert_user(name, email, hash_password(password), UserRole::Regular, Utc::now())
            .await?;
        tracing::info!("Registered user {} ({})", user.user_id, user.email);

        Ok(user.public())
    }

    /// A failed lookup and a wrong password return the same error, so the
    /// response does not reveal which emails are registered.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserPublic, DataManagerError> {
        let Some(user) = self.database.get_user_by_email(email).await? else {
            return Err(DataManagerError::InvalidCredentials);
        };
        if user.password_hash != hash_password(password) {
            return Err(DataManagerError::InvalidCredentials);
        }
        Ok(user.public())
    }

    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), DataManagerError> {
        let Some(user) = self.database.get_user_by_email(email).await? else {
            return Err(TripError::UserNotFound.into());
        };
        self.database.set_user_password(user.user_id, hash_password(new_password)).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<UserPublic>, DataManagerError> {
        Ok(self.database.get_user(user_id).await?.map(|user| user.public()))
    }

    pub async fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserPublic>, DataManagerError> {
        Ok(self.database.get_user_by_email(email).await?.map(|user| user.public()))
    }

    pub async fn get_users_by_ids(&self, user_ids: &[i64]) -> Result<Vec<UserPublic>, DataManagerError> {
        let users = self.database.get_users_by_ids(user_ids).await?;
        Ok(users.iter().map(|user| user.public()).collect())
    }

    // Trips

    pub async fn create_trip(&self, owner: &UserPublic, title: String, description: String, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Result<Trip, DataManagerError> {
        check_date_range(start_date, end_date)?;
        let trip = self.database.insert_trip(owner.user_id, title, description, start_date, end_date).await?;
        tracing::info!("User {} created trip {}", owner.user_id, trip.trip_id);
        Ok(trip)
    }

    async fn fetch_trip(&self, trip_id: i64) -> Result<Trip, DataManagerError> {
        match self.database.get_trip(trip_id).await? {
            Some(trip) => Ok(trip),
            None => Err(TripError::TripNotFound.into()),
        }
    }

    pub async fn get_trip_for(&self, actor: &UserPublic, trip_id: i64) -> Result<Trip, DataManagerError> {
        let trip = self.fetch_trip(trip_id).await?;
        if !trip.can_view(actor) {
            return Err(TripError::Unauthorized.into());
        }
        Ok(trip)
    }

    /// Every trip the actor may view: owned, shared, or (for admins) all.
    pub async fn get_authorized_trips(&self, actor: &UserPublic) -> Result<Vec<Trip>, DataManagerError> {
        let trips = self.database.get_trips().await?;
        Ok(trips.into_iter().filter(|trip| trip.can_view(actor)).collect())
    }

    pub async fn update_trip_details(&self, actor: &UserPublic, trip_id: i64, patch: TripPatch) -> Result<Trip, DataManagerError> {
        let mut trip = self.fetch_trip(trip_id).await?;
        trip.update_details(actor, patch)?;
        self.database.update_trip(&trip).await?;
        Ok(trip)
    }

    pub async fn delete_trip(&self, actor: &UserPublic, trip_id: i64) -> Result<(), DataManagerError> {
        let trip = self.fetch_trip(trip_id).await?;
        if !trip.can_manage_membership(actor) {
            return Err(TripError::Unauthorized.into());
        }
        self.database.delete_trip(trip_id).await?;
        tracing::info!("User {} deleted trip {}", actor.user_id, trip_id);
        Ok(())
    }

    // Membership

    pub async fn add_user_to_list(&self, actor: &UserPublic, trip_id: i64, target_user_id: i64, list: MembershipList) -> Result<Trip, DataManagerError> {
        let mut trip = self.fetch_trip(trip_id).await?;
        if !trip.can_manage_membership(actor) {
            return Err(TripError::Unauthorized.into());
        }
        if self.database.get_user(target_user_id).await?.is_none() {
            return Err(TripError::UserNotFound.into());
        }

        trip.add_to_list(actor, target_user_id, list)?;
        self.database.update_trip(&trip).await?;

        Ok(trip)
    }

    pub async fn remove_user_from_trip(&self, actor: &UserPublic, trip_id: i64, target_user_id: i64) -> Result<Trip, DataManagerError> {
        let mut trip = self.fetch_trip(trip_id).await?;
        trip.remove_from_list(actor, target_user_id)?;
        self.database.update_trip(&trip).await?;
        Ok(trip)
    }

    // Places

    pub async fn add_place(&self, actor: &UserPublic, trip_id: i64, data: NewPlace) -> Result<Place, DataManagerError> {
        let mut trip = self.fetch_trip(trip_id).await?;
        let place = trip.add_place(actor, data)?;
        self.database.update_trip(&trip).await?;
        Ok(place)
    }

    pub async fn update_place(&self, actor: &UserPublic, trip_id: i64, place_id: i64, patch: PlacePatch) -> Result<Place, DataManagerError> {
        let mut trip = self.fetch_trip(trip_id).await?;
        let place = trip.update_place(actor, place_id, patch)?;
        self.database.update_trip(&trip).await?;
        Ok(place)
    }

    pub async fn delete_place(&self, actor: &UserPublic, trip_id: i64, place_id: i64) -> Result<(), DataManagerError> {
        let mut trip = self.fetch_trip(trip_id).await?;
        trip.delete_place(actor, place_id)?;
        self.database.update_trip(&trip).await?;
        Ok(())
    }

    pub async fn get_trip_places(&self, actor: &UserPublic, trip_id: i64) -> Result<Vec<Place>, DataManagerError> {
        let trip = self.get_trip_for(actor, trip_id).await?;
        Ok(place::sorted_by_day(&trip.places))
    }

    pub async fn get_places_by_day(&self, actor: &UserPublic, trip_id: i64) -> Result<BTreeMap<u32, Vec<Place>>, DataManagerError> {
        let trip = self.get_trip_for(actor, trip_id).await?;
        Ok(place::group_by_day(&trip.places))
    }

    // Display helpers

    /// Resolves ids to display names for the participant lists.
    pub async fn format_user_list(&self, user_ids: &[i64]) -> Result<String, DataManagerError> {
        if user_ids.is_empty() {
            return Ok("none".to_string());
        }

        let users = self.database.get_users_by_ids(user_ids).await?;
        let names = user_ids.iter()
            .map(|id| users.iter()
                .find(|user| user.user_id == *id)
                .map(|user| user.name.clone())
                .unwrap_or_else(|| "unknown user".to_string()))
            .collect::<Vec<String>>();

        Ok(names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager() -> DataManager {
        DataManager::start_in_memory().await.unwrap()
    }

    async fn register(manager: &DataManager, name: &str, email: &str) -> UserPublic {
        manager.register_user(name.to_string(), email.to_string(), "secret").await.unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn fresh_database_has_seeded_admin() {
        let manager = manager().await;
        let admin = manager.lookup_user_by_email("admin@app.com").await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn registration_rejects_duplicate_email() {
        let manager = manager().await;
        register(&manager, "Olena", "olena@example.com").await;

        let err = manager
            .register_user("Impostor".to_string(), "olena@example.com".to_string(), "other")
            .await
            .unwrap_err();
        assert!(matches!(err, DataManagerError::EmailTaken));
    }

    #[tokio::test]
    async fn login_checks_password_digest() {
        let manager = manager().await;
        register(&manager, "Olena", "olena@example.com").await;

        let user = manager.login("olena@example.com", "secret").await.unwrap();
        assert_eq!(user.email, "olena@example.com");
        assert_eq!(user.role, UserRole::Regular);

        let err = manager.login("olena@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, DataManagerError::InvalidCredentials));
    }

    #[tokio::test]
    async fn reset_password_replaces_digest() {
        let manager = manager().await;
        register(&manager, "Olena", "olena@example.com").await;

        manager.reset_password("olena@example.com", "new-secret").await.unwrap();
        assert!(manager.login("olena@example.com", "secret").await.is_err());
        manager.login("olena@example.com", "new-secret").await.unwrap();

        let err = manager.reset_password("nobody@example.com", "x").await.unwrap_err();
        assert!(matches!(err, DataManagerError::Trip(TripError::UserNotFound)));
    }

    #[tokio::test]
    async fn collaborator_demoted_to_member_loses_content_rights() {
        let manager = manager().await;
        let owner = register(&manager, "Owner", "owner@example.com").await;
        let guest = register(&manager, "Guest", "guest@example.com").await;

        let trip = manager
            .create_trip(&owner, "Carpathians".to_string(), String::new(), None, None)
            .await
            .unwrap();

        manager
            .add_user_to_list(&owner, trip.trip_id, guest.user_id, MembershipList::Collaborator)
            .await
            .unwrap();

        let place = manager
            .add_place(&guest, trip.trip_id, NewPlace {
                location_name: "Hoverla".to_string(),
                notes: None,
                day_number: 1,
            })
            .await
            .unwrap();

        // Reassignment is a move: the collaborator entry disappears.
        let trip_after = manager
            .add_user_to_list(&owner, trip.trip_id, guest.user_id, MembershipList::Member)
            .await
            .unwrap();
        assert!(trip_after.collaborator_ids.is_empty());
        assert_eq!(trip_after.member_ids, vec![guest.user_id]);

        assert!(!trip_after.can_manage_content(&guest));
        assert!(trip_after.can_view(&guest));

        let err = manager.delete_place(&guest, trip.trip_id, place.place_id).await.unwrap_err();
        assert!(matches!(err, DataManagerError::Trip(TripError::Unauthorized)));

        let places = manager.get_trip_places(&guest, trip.trip_id).await.unwrap();
        assert_eq!(places.len(), 1);
    }

    #[tokio::test]
    async fn unrelated_user_cannot_touch_membership() {
        let manager = manager().await;
        let owner = register(&manager, "Owner", "owner@example.com").await;
        let member = register(&manager, "Member", "member@example.com").await;
        let outsider = register(&manager, "Outsider", "outsider@example.com").await;

        let trip = manager
            .create_trip(&owner, "Alps".to_string(), String::new(), None, None)
            .await
            .unwrap();
        manager
            .add_user_to_list(&owner, trip.trip_id, member.user_id, MembershipList::Member)
            .await
            .unwrap();

        let err = manager
            .remove_user_from_trip(&outsider, trip.trip_id, member.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DataManagerError::Trip(TripError::Unauthorized)));

        let unchanged = manager.get_trip_for(&owner, trip.trip_id).await.unwrap();
        assert_eq!(unchanged.member_ids, vec![member.user_id]);
    }

    #[tokio::test]
    async fn adding_unknown_user_to_list_fails() {
        let manager = manager().await;
        let owner = register(&manager, "Owner", "owner@example.com").await;
        let trip = manager
            .create_trip(&owner, "Alps".to_string(), String::new(), None, None)
            .await
            .unwrap();

        let err = manager
            .add_user_to_list(&owner, trip.trip_id, 9999, MembershipList::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, DataManagerError::Trip(TripError::UserNotFound)));
    }

    #[tokio::test]
    async fn place_day_zero_is_rejected_and_nothing_persists() {
        let manager = manager().await;
        let owner = register(&manager, "Owner", "owner@example.com").await;
        let trip = manager
            .create_trip(&owner, "Alps".to_string(), String::new(), None, None)
            .await
            .unwrap();

        let err = manager
            .add_place(&owner, trip.trip_id, NewPlace {
                location_name: "Nowhere".to_string(),
                notes: None,
                day_number: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DataManagerError::Trip(TripError::Validation(_))));

        let stored = manager.get_trip_for(&owner, trip.trip_id).await.unwrap();
        assert!(stored.places.is_empty());
    }

    #[tokio::test]
    async fn membership_and_places_survive_the_database_round_trip() {
        let manager = manager().await;
        let owner = register(&manager, "Owner", "owner@example.com").await;
        let friend = register(&manager, "Friend", "friend@example.com").await;

        let trip = manager
            .create_trip(&owner, "Alps".to_string(), "Winter".to_string(), Some(date("2026-02-01")), Some(date("2026-02-10")))
            .await
            .unwrap();
        manager
            .add_user_to_list(&owner, trip.trip_id, friend.user_id, MembershipList::Collaborator)
            .await
            .unwrap();
        manager
            .add_place(&owner, trip.trip_id, NewPlace {
                location_name: "Zermatt".to_string(),
                notes: Some("Cable car".to_string()),
                day_number: 2,
            })
            .await
            .unwrap();
        manager
            .add_place(&owner, trip.trip_id, NewPlace {
                location_name: "Geneva".to_string(),
                notes: None,
                day_number: 1,
            })
            .await
            .unwrap();

        let stored = manager.get_trip_for(&owner, trip.trip_id).await.unwrap();
        assert_eq!(stored.collaborator_ids, vec![friend.user_id]);
        assert_eq!(stored.places.len(), 2);
        assert_eq!(stored.next_place_id, 3);
        assert_eq!(stored.start_date, Some(date("2026-02-01")));

        let places = manager.get_trip_places(&friend, trip.trip_id).await.unwrap();
        assert_eq!(places[0].location_name, "Geneva");
        assert_eq!(places[1].location_name, "Zermatt");

        let by_day = manager.get_places_by_day(&friend, trip.trip_id).await.unwrap();
        assert_eq!(by_day[&1].len(), 1);
        assert_eq!(by_day[&2].len(), 1);
    }

    #[tokio::test]
    async fn trip_listing_is_filtered_by_view_access() {
        let manager = manager().await;
        let owner = register(&manager, "Owner", "owner@example.com").await;
        let other = register(&manager, "Other", "other@example.com").await;

        manager.create_trip(&owner, "Visible".to_string(), String::new(), None, None).await.unwrap();
        manager.create_trip(&other, "Hidden".to_string(), String::new(), None, None).await.unwrap();

        let trips = manager.get_authorized_trips(&owner).await.unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].title, "Visible");

        let admin = manager.login("admin@app.com", "admin").await.unwrap();
        let all_trips = manager.get_authorized_trips(&admin).await.unwrap();
        assert_eq!(all_trips.len(), 2);
    }

    #[tokio::test]
    async fn trip_details_update_validates_dates_and_rights() {
        let manager = manager().await;
        let owner = register(&manager, "Owner", "owner@example.com").await;
        let other = register(&manager, "Other", "other@example.com").await;
        let trip = manager
            .create_trip(&owner, "Alps".to_string(), String::new(), Some(date("2026-02-01")), Some(date("2026-02-10")))
            .await
            .unwrap();

        let err = manager
            .update_trip_details(&other, trip.trip_id, TripPatch {
                title: Some("Hijacked".to_string()),
                ..TripPatch::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DataManagerError::Trip(TripError::Unauthorized)));

        let err = manager
            .update_trip_details(&owner, trip.trip_id, TripPatch {
                end_date: Some(date("2026-01-01")),
                ..TripPatch::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DataManagerError::Trip(TripError::Validation(_))));

        let updated = manager
            .update_trip_details(&owner, trip.trip_id, TripPatch {
                title: Some("Alps 2026".to_string()),
                ..TripPatch::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.title, "Alps 2026");

        // Admin may edit and delete any trip.
        let admin = manager.login("admin@app.com", "admin").await.unwrap();
        manager.delete_trip(&admin, trip.trip_id).await.unwrap();
        let err = manager.get_trip_for(&owner, trip.trip_id).await.unwrap_err();
        assert!(matches!(err, DataManagerError::Trip(TripError::TripNotFound)));
    }

    #[tokio::test]
    async fn user_list_formatting_resolves_names() {
        let manager = manager().await;
        let olena = register(&manager, "Olena", "olena@example.com").await;
        let taras = register(&manager, "Taras", "taras@example.com").await;

        assert_eq!(manager.format_user_list(&[]).await.unwrap(), "none");
        assert_eq!(
            manager.format_user_list(&[olena.user_id, taras.user_id]).await.unwrap(),
            "Olena, Taras"
        );
        assert_eq!(
            manager.format_user_list(&[olena.user_id, 9999]).await.unwrap(),
            "Olena, unknown user"
        );
    }
}
