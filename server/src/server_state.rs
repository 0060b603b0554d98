use bimap::BiMap;
use tokio::sync::Mutex;
use trip_planner_data_management::DataManager;

pub struct ServerState {
    pub data_manager: DataManager,
    // Session token <-> user id. One active session per user; logging in
    // again displaces the previous token.
    pub sessions: Mutex<BiMap<String, i64>>,
}
