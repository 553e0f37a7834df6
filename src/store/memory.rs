use std::collections::BTreeMap;

use chrono::Utc;

use super::{QuestionColumns, QuestionRow};
use crate::types::questionnaire::{NewQuestionnaire, Questionnaire, QuestionnaireId};

/// Process-local stand-in for the database tables. Ids are handed out
/// the way a `SERIAL` column would: increasing and never reused.
#[derive(Debug, Default)]
pub(crate) struct MemoryTables {
    questions: BTreeMap<i32, QuestionRow>,
    last_question_id: i32,
    questionnaires: BTreeMap<i32, Questionnaire>,
    last_questionnaire_id: i32,
}

impl MemoryTables {
    pub fn get_questions(&self, limit: Option<u32>, offset: u32) -> Vec<QuestionRow> {
        let page = self.questions.values().skip(offset as usize).cloned();
        match limit {
            Some(limit) => page.take(limit as usize).collect(),
            None => page.collect(),
        }
    }

    pub fn get_question(&self, id: i32) -> Option<QuestionRow> {
        self.questions.get(&id).cloned()
    }

    pub fn add_question(&mut self, columns: QuestionColumns) -> QuestionRow {
        self.last_question_id += 1;
        let now = Utc::now();
        let row = QuestionRow {
            id: self.last_question_id,
            columns,
            created_at: now,
            updated_at: now,
        };
        self.questions.insert(row.id, row.clone());
        row
    }

    pub fn update_question(&mut self, id: i32, columns: QuestionColumns) -> Option<QuestionRow> {
        let row = self.questions.get_mut(&id)?;
        row.columns = columns;
        row.updated_at = Utc::now();
        Some(row.clone())
    }

    pub fn delete_question(&mut self, id: i32) -> bool {
        self.questions.remove(&id).is_some()
    }

    pub fn existing_question_ids(&self, ids: &[i32]) -> Vec<i32> {
        ids.iter()
            .filter(|id| self.questions.contains_key(*id))
            .copied()
            .collect()
    }

    pub fn add_questionnaire(&mut self, new_questionnaire: NewQuestionnaire) -> Questionnaire {
        self.last_questionnaire_id += 1;
        let now = Utc::now();
        let questionnaire = Questionnaire {
            id: QuestionnaireId(self.last_questionnaire_id),
            title: new_questionnaire.title,
            description: new_questionnaire.description,
            question_ids: new_questionnaire.question_ids,
            created_at: now,
            updated_at: now,
        };
        self.questionnaires
            .insert(self.last_questionnaire_id, questionnaire.clone());
        questionnaire
    }

    pub fn get_questionnaire(&self, id: i32) -> Option<Questionnaire> {
        self.questionnaires.get(&id).cloned()
    }
}
