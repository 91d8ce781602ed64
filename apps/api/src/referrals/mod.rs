// Referral workflow: students ask alumni for job referrals; alumni accept or reject once.

pub mod handlers;
pub mod notify;
pub mod rate_limit;
pub mod store;
pub mod workflow;
