pub mod attendance;
pub mod core;
pub mod gamification;
pub mod grades;
pub mod ranking;
pub mod session;
