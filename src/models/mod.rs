mod appointment;
mod medication;
mod notification;
mod user;

pub use appointment::*;
pub use medication::*;
pub use notification::*;
pub use user::*;
