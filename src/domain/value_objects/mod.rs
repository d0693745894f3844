pub mod due_dates;
pub mod enums;
pub mod goal_lifecycle;
pub mod goals;
pub mod iam;
pub mod payments;
pub mod submission_review;
pub mod submissions;
pub mod users;
