pub mod console;
pub mod imessage;

use crate::domain::models::Messenger;
use crate::domain::models::MessengerName;

pub type MessengerBox = Box<dyn Messenger + Send + Sync>;

pub struct MessengerManager {}

impl MessengerManager {
    pub fn get(name: MessengerName) -> MessengerBox {
        match name {
            MessengerName::Console => return Box::<console::Console>::default(),
            MessengerName::IMessage => return Box::<imessage::IMessage>::default(),
        }
    }
}
