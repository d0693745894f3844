pub mod daily_submissions;
pub mod goals;
pub mod payment_gateways;
pub mod payments;
pub mod storage;
pub mod users;
