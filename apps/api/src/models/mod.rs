pub mod discussion;
pub mod error_log;
pub mod profile;
pub mod referral;
