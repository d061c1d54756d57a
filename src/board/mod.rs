//! Client-side state for projects, tasks and the kanban board.
//!
//! | Module        | Responsibility                                        |
//! |---------------|-------------------------------------------------------|
//! | `models`      | Wire and domain types (users, projects, tasks, chat)  |
//! | `api`         | `RemoteApi` contract and its reqwest implementation   |
//! | `token`       | Persisted bearer token                                |
//! | `session`     | Logged-in user and team roster                        |
//! | `store`       | Shared project collection and all task mutations      |
//! | `events`      | Broadcast notifications after store mutations         |
//! | `transitions` | Column partitioning, status moves, reorder math       |
//! | `kanban`      | Drag-and-drop state machine over the store            |
//! | `chat`        | In-memory per-project chat log                        |
//! | `analytics`   | Per-project and dashboard statistics                  |

pub mod analytics;
pub mod api;
pub mod chat;
pub mod events;
pub mod kanban;
pub mod models;
pub mod session;
pub mod store;
pub mod token;
pub mod transitions;

pub use api::{HttpApiClient, RemoteApi};
pub use chat::ChatLog;
pub use kanban::KanbanBoard;
pub use session::SessionStore;
pub use store::ProjectStore;
