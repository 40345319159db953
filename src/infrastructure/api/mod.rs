pub mod tutor;

use crate::domain::models::TutorApi;

pub type TutorApiBox = Box<dyn TutorApi + Send + Sync>;

pub struct TutorApiManager {}

impl TutorApiManager {
    pub fn get() -> TutorApiBox {
        return Box::<tutor::Tutor>::default();
    }
}
