//! PDF question-answering assistant: upload a PDF, ask questions, get
//! answers from hosted or local models, scored and optionally improved.

pub mod analysis;
pub mod config;
pub mod docs;
pub mod llm;
pub mod models;
pub mod qa;
pub mod quality;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

pub use server::{app_router, run_server};
pub use state::AppState;
