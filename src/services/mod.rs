//! Service layer: orchestration between the HTTP surface, the shared state,
//! and the progress store.

pub mod documentation;
pub mod health_service;
pub mod progress_service;
pub mod scoreboard_push;
pub mod scoreboard_service;
pub mod sse_service;
pub mod storage_supervisor;
