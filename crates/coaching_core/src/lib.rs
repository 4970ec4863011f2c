pub mod catalog;
pub mod coaching;
pub mod domain;
pub mod guard;
pub mod ports;
pub mod progress;
pub mod scoring;
pub mod store;

#[cfg(test)]
mod test_support;

pub use coaching::{CoachingOrchestrator, CoachingTurn};
pub use domain::{
    AnsweredQuestion, Answer, Assessment, AssessmentResult, ChatMessage, ChatSession,
    LearningModule, ProgressUpdate, PromptMessage, Role, User, UserContext, UserCredentials,
    UserProgress, UserUpdate,
};
pub use guard::Caller;
pub use ports::{
    AssessmentAnalysisService, CoachingService, EntityStore, PortError, PortResult,
};
pub use scoring::ScoringOrchestrator;
pub use store::MemStore;
