//! Assessments and the scores students receive on them.
//!
//! Scores and weights are integer hundredths (`1250` is 12.50 points).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolerp_core::{
    AssessmentId, AssessmentScoreId, DomainError, DomainResult, Entity, EntityRef, OwnerLink,
    ResourceKind, SchoolLink, SectionId, StudentId, SubjectId, TenantScoped, TermId, UserId,
    require_text,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub term: TermId,
    pub section: SectionId,
    pub subject: SubjectId,
    pub name: String,
    pub max_score: u32,
    pub weight: u32,
}

impl Assessment {
    pub fn new(
        term: TermId,
        section: SectionId,
        subject: SubjectId,
        name: impl Into<String>,
        max_score: u32,
    ) -> Self {
        Self {
            id: AssessmentId::new(),
            term,
            section,
            subject,
            name: name.into(),
            max_score,
            weight: 100,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("assessment name", &self.name)?;
        if self.max_score == 0 {
            return Err(DomainError::validation("max score must be positive"));
        }
        Ok(())
    }
}

impl Entity for Assessment {
    type Id = AssessmentId;
    const KIND: ResourceKind = ResourceKind::Assessment;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef::Assessment(self.id))
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![
            EntityRef::Term(self.term),
            EntityRef::Section(self.section),
            EntityRef::Subject(self.subject),
        ]
    }
}

impl TenantScoped for Assessment {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Subject(self.subject))
    }
}

/// A student's result on an assessment. Unique per (assessment, student).
///
/// `graded_by` / `graded_at` are stamped by the write path on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentScore {
    pub id: AssessmentScoreId,
    pub assessment: AssessmentId,
    pub student: StudentId,
    /// `None` until graded.
    pub score: Option<u32>,
    pub graded_by: Option<UserId>,
    pub graded_at: DateTime<Utc>,
}

impl AssessmentScore {
    pub fn new(assessment: AssessmentId, student: StudentId, score: Option<u32>) -> Self {
        Self {
            id: AssessmentScoreId::new(),
            assessment,
            student,
            score,
            graded_by: None,
            graded_at: Utc::now(),
        }
    }

    /// Check the score against the assessment it belongs to.
    pub fn validate_against(&self, assessment: &Assessment) -> DomainResult<()> {
        if assessment.id != self.assessment {
            return Err(DomainError::invariant("score checked against a different assessment"));
        }
        match self.score {
            Some(score) if score > assessment.max_score => Err(DomainError::invariant(format!(
                "score {score} exceeds max score {}",
                assessment.max_score
            ))),
            _ => Ok(()),
        }
    }
}

impl Entity for AssessmentScore {
    type Id = AssessmentScoreId;
    const KIND: ResourceKind = ResourceKind::AssessmentScore;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn references(&self) -> Vec<EntityRef> {
        vec![
            EntityRef::Assessment(self.assessment),
            EntityRef::Student(self.student),
        ]
    }
}

impl TenantScoped for AssessmentScore {
    fn school_link(&self) -> SchoolLink {
        SchoolLink::Via(EntityRef::Student(self.student))
    }

    fn owner_link(&self) -> OwnerLink {
        OwnerLink::Student(self.student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn math_quiz() -> Assessment {
        Assessment::new(TermId::new(), SectionId::new(), SubjectId::new(), "Quiz 1", 2000)
    }

    #[test]
    fn score_above_max_is_rejected() {
        let quiz = math_quiz();
        let score = AssessmentScore::new(quiz.id, StudentId::new(), Some(2050));
        assert!(score.validate_against(&quiz).is_err());
    }

    #[test]
    fn ungraded_score_is_valid() {
        let quiz = math_quiz();
        let score = AssessmentScore::new(quiz.id, StudentId::new(), None);
        assert!(score.validate_against(&quiz).is_ok());
    }

    #[test]
    fn zero_max_score_is_rejected() {
        let mut quiz = math_quiz();
        quiz.max_score = 0;
        assert!(quiz.validate().is_err());
    }
}
