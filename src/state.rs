use crate::session::Session;
use crate::storage::HistoryRepository;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub repository: HistoryRepository,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    /// Open a session over whatever history the repository already holds.
    pub async fn new(repository: HistoryRepository) -> Self {
        let session = Session::new(repository.load().await);
        Self {
            repository,
            session: Arc::new(Mutex::new(session)),
        }
    }
}
