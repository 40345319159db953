mod attributed_body;
mod bot;
mod conversation;
mod markdown;
mod roadmaps;
mod sessions;

pub use attributed_body::*;
pub use bot::*;
pub use conversation::*;
pub use markdown::*;
pub use roadmaps::*;
pub use sessions::*;
