// Core checkout services
pub mod aggregation;
pub mod checkout;
pub mod discounts;
pub mod payment_status;
pub mod polling;
pub mod submission;
