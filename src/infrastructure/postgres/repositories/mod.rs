pub mod daily_submissions;
pub mod goals;
pub mod payments;
pub mod users;
