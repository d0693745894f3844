pub mod admin;
pub mod goals;
pub mod instructor;
pub mod paypal;
pub mod submissions;
pub mod users;
