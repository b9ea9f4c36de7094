//! Grade, attendance, leaderboard and progress calculations for the Clasfy dashboard,
//! plus the line-delimited JSON sidecar that serves them.

pub mod attendance;
pub mod calc;
pub mod config;
pub mod db;
pub mod error;
pub mod gamification;
pub mod ipc;
pub mod logging;
pub mod ranking;
pub mod session;
