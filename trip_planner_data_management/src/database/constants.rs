#![allow(dead_code)]

pub const USERS_TABLE_NAME: &str = "Users";
pub const USER_ID: &str = "user_id";
pub const NAME: &str = "name";
pub const EMAIL: &str = "email";
pub const PASSWORD_HASH: &str = "password_hash";
pub const ROLE: &str = "role";
pub const JOIN_DATE: &str = "join_date";

pub const TRIPS_TABLE_NAME: &str = "Trips";
pub const TRIP_ID: &str = "trip_id";
pub const OWNER_ID: &str = "owner_id";
pub const COLLABORATOR_IDS: &str = "collaborator_ids";
pub const MEMBER_IDS: &str = "member_ids";
pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";
pub const PLACES: &str = "places";
pub const NEXT_PLACE_ID: &str = "next_place_id";
