// API module
//
// This module contains the HTTP front end for the blockchain

pub mod handlers;
pub mod routes;

// Re-export main components for easier access
pub use routes::configure_routes;
