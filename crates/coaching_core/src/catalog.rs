//! crates/coaching_core/src/catalog.rs
//!
//! The seed catalog of learning modules and assessments loaded at startup.

use crate::domain::{
    Assessment, Difficulty, Exercise, LearningModule, Lesson, ModuleContent, Question,
    QuestionKind,
};

#[allow(clippy::too_many_arguments)]
fn module(
    id: &str,
    title: &str,
    description: &str,
    difficulty: Difficulty,
    duration: u32,
    exercises: u32,
    lesson: (&str, &str, &str, &str),
    image_url: &str,
) -> LearningModule {
    let (lesson_title, lesson_content, exercise_question, exercise_kind) = lesson;
    LearningModule {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        difficulty,
        duration,
        exercises,
        content: ModuleContent {
            lessons: vec![Lesson {
                title: lesson_title.to_string(),
                content: lesson_content.to_string(),
                exercises: vec![Exercise {
                    question: exercise_question.to_string(),
                    kind: exercise_kind.to_string(),
                }],
            }],
        },
        image_url: Some(image_url.to_string()),
    }
}

fn question(
    id: &str,
    text: &str,
    kind: QuestionKind,
    options: Option<&[&str]>,
    category: &str,
) -> Question {
    Question {
        id: id.to_string(),
        question: text.to_string(),
        kind,
        options: options.map(|opts| opts.iter().map(|o| o.to_string()).collect()),
        category: category.to_string(),
    }
}

/// The four seeded learning modules, ids "1" to "4".
pub fn learning_modules() -> Vec<LearningModule> {
    vec![
        module(
            "1",
            "Active Listening Skills",
            "Learn how to truly listen and understand others in conversations. Practice techniques for better engagement.",
            Difficulty::Beginner,
            25,
            5,
            (
                "Introduction to Active Listening",
                "Active listening is a fundamental skill for healthy relationships...",
                "What are the key components of active listening?",
                "multiple_choice",
            ),
            "https://images.unsplash.com/photo-1522202176988-66273c2fd55f?ixlib=rb-4.0.3&auto=format&fit=crop&w=100&h=100",
        ),
        module(
            "2",
            "Emotional Intelligence",
            "Understand and manage emotions effectively in relationships. Learn to recognize emotional patterns.",
            Difficulty::Intermediate,
            40,
            8,
            (
                "Understanding Emotions",
                "Emotional intelligence involves recognizing and managing emotions...",
                "Identify the emotion in this scenario",
                "multiple_choice",
            ),
            "https://images.unsplash.com/photo-1551601651-2a8555f1a136?ixlib=rb-4.0.3&auto=format&fit=crop&w=100&h=100",
        ),
        module(
            "3",
            "Conflict Resolution",
            "Navigate disagreements constructively and find mutually beneficial solutions in relationships.",
            Difficulty::Advanced,
            35,
            6,
            (
                "Understanding Conflict",
                "Conflict is a natural part of relationships when handled properly...",
                "What is the first step in resolving conflict?",
                "text",
            ),
            "https://images.unsplash.com/photo-1573496359142-b8d87734a5a2?ixlib=rb-4.0.3&auto=format&fit=crop&w=100&h=100",
        ),
        module(
            "4",
            "Building Trust",
            "Learn the fundamentals of building and maintaining trust in personal and professional relationships.",
            Difficulty::Beginner,
            30,
            7,
            (
                "Trust Foundations",
                "Trust is built through consistent actions and honest communication...",
                "What actions build trust?",
                "multiple_choice",
            ),
            "https://images.unsplash.com/photo-1556761175-b413da4baf72?ixlib=rb-4.0.3&auto=format&fit=crop&w=100&h=100",
        ),
    ]
}

/// The three seeded assessments, ids "1" to "3".
pub fn assessments() -> Vec<Assessment> {
    vec![
        Assessment {
            id: "1".to_string(),
            title: "Communication Style".to_string(),
            description: "Discover your natural communication patterns and learn how to adapt them for better relationships.".to_string(),
            duration: 15,
            questions: vec![question(
                "1",
                "When someone disagrees with you, you typically:",
                QuestionKind::MultipleChoice,
                Some(&[
                    "Listen to their perspective first",
                    "Defend your position immediately",
                    "Try to find common ground",
                    "Avoid the conversation",
                ]),
                "communication",
            )],
        },
        Assessment {
            id: "2".to_string(),
            title: "Social Awareness".to_string(),
            description: "Evaluate your ability to read social cues and understand others' emotions and intentions.".to_string(),
            duration: 20,
            questions: vec![question(
                "1",
                "How well can you tell when someone is uncomfortable in a social situation?",
                QuestionKind::Scale,
                None,
                "social_awareness",
            )],
        },
        Assessment {
            id: "3".to_string(),
            title: "Conflict Resolution".to_string(),
            description: "Assess your approach to handling disagreements and your skills in finding solutions.".to_string(),
            duration: 18,
            questions: vec![question(
                "1",
                "Describe how you would handle a disagreement with a close friend:",
                QuestionKind::Text,
                None,
                "conflict_resolution",
            )],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_four_modules_with_sequential_ids() {
        let ids: Vec<String> = learning_modules().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn active_listening_is_a_short_beginner_module() {
        let modules = learning_modules();
        let listening = modules
            .iter()
            .find(|m| m.title == "Active Listening Skills")
            .expect("seeded module");
        assert_eq!(listening.difficulty, Difficulty::Beginner);
        assert_eq!(listening.duration, 25);
        assert_eq!(listening.exercises, 5);
    }

    #[test]
    fn every_assessment_has_categorised_questions() {
        let assessments = assessments();
        assert_eq!(assessments.len(), 3);
        for assessment in &assessments {
            assert!(!assessment.questions.is_empty());
            assert!(assessment.questions.iter().all(|q| !q.category.is_empty()));
        }
    }
}
