mod challenge;
mod command;
mod event;
mod history;
mod messenger;
mod model_name;
mod roadmap;
mod session;
mod tutor_api;

pub use challenge::*;
pub use command::*;
pub use event::*;
pub use history::*;
pub use messenger::*;
pub use model_name::*;
pub use roadmap::*;
pub use session::*;
pub use tutor_api::*;
