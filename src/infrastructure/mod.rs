pub mod api;
pub mod messengers;
