mod appointment_handler;
mod medication_handler;
mod notification_handler;
mod user_handler;

pub use appointment_handler::*;
pub use medication_handler::*;
pub use notification_handler::*;
pub use user_handler::*;
