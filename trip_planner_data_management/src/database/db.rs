use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use const_format::concatcp;
use sqlx::{query, query_as, sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite, SqlitePool};
use trip_planner_lib::{trip::Trip, user::{User, UserRole}};

use crate::{hash_password, DataManagerError, DATABASE_PATH};

use super::constants::*;

#[derive(Clone)]
pub struct TripDatabase {
    pool: Pool<Sqlite>,
}

impl TripDatabase {
    pub async fn connect() -> Result<Self, DataManagerError> {
        let root: PathBuf = project_root::get_project_root()
            .map_err(|_| DataManagerError::Database("Failed to locate project root".to_string()))?;
        let options = SqliteConnectOptions::new()
            .filename(root.join(DATABASE_PATH))
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await
            .map_err(|_| DataManagerError::Database("Failed to connect to database".to_string()))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Private in-memory database, used by tests. A single connection keeps
    /// the database alive for the pool's lifetime.
    pub async fn connect_in_memory() -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options).await
            .map_err(|_| DataManagerError::Database("Failed to open in-memory database".to_string()))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    pub async fn init(&self) -> Result<(), DataManagerError> {
        query(concatcp!("
            CREATE TABLE IF NOT EXISTS ", USERS_TABLE_NAME, "(",
                USER_ID,       " INTEGER PRIMARY KEY AUTOINCREMENT,",
                NAME,          " TEXT NOT NULL,",
                EMAIL,         " TEXT NOT NULL UNIQUE,",
                PASSWORD_HASH, " TEXT NOT NULL,",
                ROLE,          " TEXT NOT NULL,",
                JOIN_DATE,     " TIMESTAMP NOT NULL)"))
            .execute(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to create users table".to_string()))?;

        query(concatcp!("
            CREATE TABLE IF NOT EXISTS ", TRIPS_TABLE_NAME, "(",
                TRIP_ID,          " INTEGER PRIMARY KEY AUTOINCREMENT,",
                OWNER_ID,         " INTEGER NOT NULL,",
                COLLABORATOR_IDS, " BLOB NOT NULL,",
                MEMBER_IDS,       " BLOB NOT NULL,",
                TITLE,            " TEXT NOT NULL,",
                DESCRIPTION,      " TEXT,",
                START_DATE,       " DATE,",
                END_DATE,         " DATE,",
                PLACES,           " BLOB NOT NULL,",
                NEXT_PLACE_ID,    " INTEGER NOT NULL,
                FOREIGN KEY(", OWNER_ID, ") REFERENCES ", USERS_TABLE_NAME, "(", USER_ID, ")
            )"))
            .execute(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to create trips table".to_string()))?;

        self.seed_admin_account().await
    }

    /// First-run setup: an empty user table gets an initial admin account so
    /// the instance can be administered at all.
    async fn seed_admin_account(&self) -> Result<(), DataManagerError> {
        let (count,) = query_as::<_, (i64,)>(concatcp!("SELECT COUNT(*) FROM ", USERS_TABLE_NAME))
            .fetch_one(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to count users".to_string()))?;

        if count == 0 {
            self.insert_user(
                "Admin".to_string(),
                "admin@app.com".to_string(),
                hash_password("admin"),
                UserRole::Admin,
                Utc::now(),
            ).await?;
            tracing::info!("Seeded initial admin account admin@app.com");
        }

        Ok(())
    }

    pub async fn insert_user(&self, name: String, email: String, password_hash: String, role: UserRole, join_date: DateTime<Utc>) -> Result<User, DataManagerError> {
        let id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", USERS_TABLE_NAME, "(",
            USER_ID, ", ", NAME, ", ", EMAIL, ", ", PASSWORD_HASH, ", ", ROLE, ", ", JOIN_DATE, ")
            VALUES (NULL, ?1, ?2, ?3, ?4, ?5) RETURNING ", USER_ID))
                .bind(&name)
                .bind(&email)
                .bind(&password_hash)
                .bind(role.as_str())
                .bind(join_date)
                .fetch_one(&self.pool).await
                .map_err(|_| DataManagerError::Database("Failed to insert user".to_string()))
                .map(|row| row.0)?;

        Ok(User::new(id, name, email, password_hash, role, join_date))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, DataManagerError> {
        query_as::<_, User>(concatcp!("SELECT * FROM ", USERS_TABLE_NAME, " WHERE ", USER_ID, " = ?1"))
            .bind(user_id)
            .fetch_optional(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get user".to_string()))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DataManagerError> {
        query_as::<_, User>(concatcp!("SELECT * FROM ", USERS_TABLE_NAME, " WHERE ", EMAIL, " = ?1"))
            .bind(email)
            .fetch_optional(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get user by email".to_string()))
    }

    /// Ids that resolve to no user are skipped, not an error.
    pub async fn get_users_by_ids(&self, user_ids: &[i64]) -> Result<Vec<User>, DataManagerError> {
        let mut users = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if let Some(user) = self.get_user(*user_id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    pub async fn set_user_password(&self, user_id: i64, password_hash: String) -> Result<(), DataManagerError> {
        query(concatcp!("UPDATE ", USERS_TABLE_NAME, " SET ", PASSWORD_HASH, " = ?1 WHERE ", USER_ID, " = ?2"))
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to set user password".to_string()))
            .map(|_| ())
    }

    pub async fn insert_trip(&self, owner_id: i64, title: String, description: String, start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Result<Trip, DataManagerError> {
        let trip_id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", TRIPS_TABLE_NAME, "(",
            TRIP_ID, ", ", OWNER_ID, ", ", COLLABORATOR_IDS, ", ", MEMBER_IDS, ", ", TITLE, ", ", DESCRIPTION, ", ", START_DATE, ", ", END_DATE, ", ", PLACES, ", ", NEXT_PLACE_ID, ")
            VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING ", TRIP_ID))
                .bind(owner_id)
                .bind(Vec::<u8>::new())
                .bind(Vec::<u8>::new())
                .bind(&title)
                .bind(&description)
                .bind(start_date)
                .bind(end_date)
                .bind(Vec::<u8>::new())
                .bind(1_i64)
                .fetch_one(&self.pool).await
                .map_err(|_| DataManagerError::Database("Failed to insert trip".to_string()))
                .map(|row| row.0)?;

        Ok(Trip::new(trip_id, owner_id, title, description, start_date, end_date))
    }

    pub async fn get_trip(&self, trip_id: i64) -> Result<Option<Trip>, DataManagerError> {
        query_as::<_, Trip>(concatcp!("SELECT * FROM ", TRIPS_TABLE_NAME, " WHERE ", TRIP_ID, " = ?1"))
            .bind(trip_id)
            .fetch_optional(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get trip".to_string()))
    }

    pub async fn get_trips(&self) -> Result<Vec<Trip>, DataManagerError> {
        query_as::<_, Trip>(concatcp!("SELECT * FROM ", TRIPS_TABLE_NAME))
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get trips".to_string()))
    }

    /// Full-document replace of every mutable column. The last writer wins;
    /// callers bound staleness by re-fetching right before they mutate.
    pub async fn update_trip(&self, trip: &Trip) -> Result<(), DataManagerError> {
        query(concatcp!("UPDATE ", TRIPS_TABLE_NAME, " SET ",
            OWNER_ID, " = ?1, ",
            COLLABORATOR_IDS, " = ?2, ",
            MEMBER_IDS, " = ?3, ",
            TITLE, " = ?4, ",
            DESCRIPTION, " = ?5, ",
            START_DATE, " = ?6, ",
            END_DATE, " = ?7, ",
            PLACES, " = ?8, ",
            NEXT_PLACE_ID, " = ?9 WHERE ", TRIP_ID, " = ?10"))
                .bind(trip.owner_id)
                .bind(trip.collaborator_ids_blob())
                .bind(trip.member_ids_blob())
                .bind(&trip.title)
                .bind(&trip.description)
                .bind(trip.start_date)
                .bind(trip.end_date)
                .bind(trip.places_blob())
                .bind(trip.next_place_id)
                .bind(trip.trip_id)
                .execute(&self.pool).await
                .map_err(|_| DataManagerError::Database("Failed to update trip".to_string()))
                .map(|_| ())
    }

    pub async fn delete_trip(&self, trip_id: i64) -> Result<(), DataManagerError> {
        query(concatcp!("DELETE FROM ", TRIPS_TABLE_NAME, " WHERE ", TRIP_ID, " = ?1"))
            .bind(trip_id)
            .execute(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to delete trip".to_string()))
            .map(|_| ())
    }
}
