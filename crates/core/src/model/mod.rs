mod answers;
mod document;
mod ids;
mod profile;
mod question;
mod quiz;
mod result;

pub use answers::AnswerMap;
pub use document::{DEFAULT_CONTENT_TYPE, Document, DocumentError};
pub use ids::{PrincipalId, PrincipalIdError};
pub use profile::Profile;
pub use question::{OPTIONS_PER_QUESTION, Question, QuestionError, QuestionOption};
pub use quiz::{MAX_QUESTIONS, Quiz, QuizError};
pub use result::{QuizResult, QuizResultError};
