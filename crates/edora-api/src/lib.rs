pub mod audit;
pub mod auth;
pub mod channels;
pub mod comments;
pub mod error;
pub mod files;
pub mod flagged_words;
pub mod gamification;
pub mod leaderboard;
pub mod middleware;
pub mod moderation;
pub mod permissions;
pub mod posts;
pub mod reactions;
pub mod router;
pub mod saved_posts;
pub mod state;
pub mod storage;
pub mod tokens;
pub mod users;
mod views;

pub use router::build_router;
pub use state::{AppState, AppStateInner, Settings};
