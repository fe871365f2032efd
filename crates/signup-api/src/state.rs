use std::sync::Arc;

use signup_db::Database;

use crate::registration::RegistrationService;
use crate::validation::Validator;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub validator: Validator,
    pub registration: RegistrationService,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>) -> AppState {
        Arc::new(Self {
            validator: Validator::registration(),
            registration: RegistrationService::new(db.clone()),
            db,
        })
    }
}
