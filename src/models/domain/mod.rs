pub mod chat;
pub mod question;
pub mod quiz_result;
pub mod quiz_session;
pub mod subject_stats;
pub mod user;

pub use chat::{ChatMessage, ChatPrompt, ChatRole, ChatTurn, TurnRole};
pub use question::{Difficulty, ExamType, Question};
pub use quiz_result::{QuestionOutcome, QuizResult};
pub use quiz_session::{AdvanceToken, FinishReason, QuizSession, SessionParams, SessionStatus};
pub use subject_stats::{ScorePoint, SubjectStats};
pub use user::User;
