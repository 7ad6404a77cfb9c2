pub mod session;
pub mod state;
pub mod types;

pub use session::{Applied, GameSession, Notice, Notices, TeacherUpdate};
pub use state::{AnswerOutcome, GameState};
pub use types::*;
