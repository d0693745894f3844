pub mod goal_statuses;
pub mod payment_statuses;
pub mod payment_types;
pub mod roles;
pub mod sort_order;
pub mod submission_statuses;
