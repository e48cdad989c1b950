use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::Question,
};

const BUNDLED: [(&str, &str); 3] = [
    ("mathematics.json", include_str!("../data/questions/mathematics.json")),
    ("english.json", include_str!("../data/questions/english.json")),
    ("economics.json", include_str!("../data/questions/economics.json")),
];

/// Read-only question catalog grouped by subject.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it
/// afterwards.
#[derive(Debug, Default)]
pub struct QuestionStore {
    subjects: Vec<String>,
    by_subject: HashMap<String, Vec<Question>>,
}

#[derive(Debug, Clone, Serialize, async_graphql::SimpleObject)]
pub struct SubjectSummary {
    pub subject: String,
    pub question_count: u32,
    pub topics: Vec<String>,
}

impl QuestionStore {
    /// Groups questions by subject, keeping first-seen subject order and the
    /// order of questions within each subject.
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> AppResult<Self> {
        let mut store = QuestionStore::default();
        let mut seen_ids = HashSet::new();

        for question in questions {
            question.validate_shape()?;
            if !seen_ids.insert(question.id.clone()) {
                return Err(AppError::ValidationError(format!(
                    "Duplicate question id '{}'",
                    question.id
                )));
            }
            store.insert(question);
        }

        Ok(store)
    }

    /// The catalog shipped with the server.
    pub fn bundled() -> AppResult<Self> {
        let mut questions = Vec::new();
        for (name, contents) in BUNDLED {
            questions.extend(parse_file(name, contents)?);
        }
        Self::from_questions(questions)
    }

    /// Bundled catalog extended with every `*.json` file in `dir`.
    ///
    /// Files are read in name order so the resulting order is stable.
    pub fn bundled_with_imports(dir: &Path) -> AppResult<Self> {
        let mut questions: Vec<Question> = Self::bundled()?.into_questions();

        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(|e| {
                AppError::InternalError(format!(
                    "Cannot read question import directory {}: {}",
                    dir.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let contents = fs::read_to_string(&path).map_err(|e| {
                AppError::InternalError(format!("Cannot read {}: {}", path.display(), e))
            })?;
            let imported = parse_file(&path.display().to_string(), &contents)?;
            log::info!("Imported {} questions from {}", imported.len(), path.display());
            questions.extend(imported);
        }

        Self::from_questions(questions)
    }

    pub fn questions(&self, subject: &str) -> &[Question] {
        self.by_subject
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(String::as_str)
    }

    pub fn contains_subject(&self, subject: &str) -> bool {
        self.by_subject.contains_key(subject)
    }

    pub fn len(&self) -> usize {
        self.by_subject.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summaries(&self) -> Vec<SubjectSummary> {
        self.subjects
            .iter()
            .map(|subject| {
                let questions = self.questions(subject);
                let mut topics: Vec<String> = Vec::new();
                for question in questions {
                    if !topics.contains(&question.topic) {
                        topics.push(question.topic.clone());
                    }
                }
                SubjectSummary {
                    subject: subject.clone(),
                    question_count: questions.len() as u32,
                    topics,
                }
            })
            .collect()
    }

    fn insert(&mut self, question: Question) {
        if !self.by_subject.contains_key(&question.subject) {
            self.subjects.push(question.subject.clone());
        }
        self.by_subject
            .entry(question.subject.clone())
            .or_default()
            .push(question);
    }

    fn into_questions(mut self) -> Vec<Question> {
        self.subjects
            .iter()
            .flat_map(|subject| self.by_subject.remove(subject).unwrap_or_default())
            .collect()
    }
}

fn parse_file(name: &str, contents: &str) -> AppResult<Vec<Question>> {
    serde_json::from_str(contents)
        .map_err(|e| AppError::ValidationError(format!("Malformed question file {}: {}", name, e)))
}
