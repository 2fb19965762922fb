pub mod session;
pub mod task;
pub mod user;

pub use session::SessionRecord;
pub use task::{GenerationKind, GenerationTask, NewGenerationTask};
pub use user::UserRecord;
