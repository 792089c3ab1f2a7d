//! HTTP adapters - ingress routing and static file serving.

pub mod router;
pub mod static_files;

pub use router::{relay_router, session_name_from_path, AppState};
pub use static_files::{escapes_root, StaticFiles};
