mod app;
mod client_ip;
mod state;

pub use app::create_app;
pub use client_ip::client_identity;
pub use state::AppState;
