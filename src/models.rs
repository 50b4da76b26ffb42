//! School and exam result records together with their column schemas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{EntitySchema, FieldDescriptor, field};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct School {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub adult: bool,
    pub small: bool,
    pub inter_bcl: bool,
    pub edu_sector: String,
    pub school_type: String,
    pub address: String,
    pub locality: String,
    pub postcode: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Natural identity of a school.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchoolKey {
    pub name: String,
    pub locality: String,
}

impl School {
    pub fn key(&self) -> SchoolKey {
        SchoolKey {
            name: self.name.clone(),
            locality: self.locality.clone(),
        }
    }
}

static SCHOOL_FIELDS: &[FieldDescriptor<School>] = &[
    field!(School, name, "name", Text),
    field!(School, adult, "adult", Boolean),
    field!(School, small, "small", Boolean),
    field!(School, inter_bcl, "inter_bcl", Boolean),
    field!(School, edu_sector, "edu_sector", Text),
    field!(School, school_type, "type", Text),
    field!(School, address, "address", Text),
    field!(School, locality, "locality", Text),
    field!(School, postcode, "postcode", Text),
    field!(School, state, "state", Text),
    field!(School, id, "", Reference),
];

pub static SCHOOL_SCHEMA: EntitySchema<School> = EntitySchema {
    entity: "school",
    fields: SCHOOL_FIELDS,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub period: i64,
    pub no_vce_studies_unit_3_4: i64,
    pub no_vet_certificates: i64,
    pub no_vce_students: i64,
    pub no_vet_students: i64,
    pub no_vcal_students: i64,
    pub percent_vce_students_apply_uni: i64,
    pub percent_completion_vce: i64,
    pub no_vce_baccalaureate: i64,
    pub percent_vet_units_completed: i64,
    pub percent_vcal_units_completed: i64,
    pub median_vce_score: i64,
    pub percent_score_40_and_over: f32,
    #[serde(rename = "school_id")]
    pub school: Option<Uuid>,
    pub ranking_score: f32,
    pub ranking_score_wma: f32,
    pub rank: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Natural identity of a result: one per school per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultKey {
    pub school: Uuid,
    pub period: i64,
}

static RESULT_FIELDS: &[FieldDescriptor<ExamResult>] = &[
    field!(ExamResult, period, "", Integer),
    field!(ExamResult, no_vce_studies_unit_3_4, "no_vce_studies_unit_3_4", Integer),
    field!(ExamResult, no_vet_certificates, "no_vet_certificates", Integer),
    field!(ExamResult, no_vce_students, "no_vce_students", Integer),
    field!(ExamResult, no_vet_students, "no_vet_students", Integer),
    field!(ExamResult, no_vcal_students, "no_vcal_students", Integer),
    field!(ExamResult, percent_vce_students_apply_uni, "percent_vce_students_apply_uni", Integer),
    field!(ExamResult, percent_completion_vce, "percent_completion_vce", Integer),
    field!(ExamResult, no_vce_baccalaureate, "no_vce_baccalaureate", Integer),
    field!(ExamResult, percent_vet_units_completed, "percent_vet_units_completed", Integer),
    field!(ExamResult, percent_vcal_units_completed, "percent_vcal_units_completed", Integer),
    field!(ExamResult, median_vce_score, "median_vce_score", Integer),
    field!(ExamResult, percent_score_40_and_over, "percent_score_40_and_over", Float),
    field!(ExamResult, school, "school_id", Reference),
    field!(ExamResult, ranking_score, "", Float),
    field!(ExamResult, ranking_score_wma, "", Float),
    field!(ExamResult, rank, "", Integer),
];

pub static RESULT_SCHEMA: EntitySchema<ExamResult> = EntitySchema {
    entity: "result",
    fields: RESULT_FIELDS,
};

impl ExamResult {
    /// `None` until the owning school has been persisted.
    pub fn key(&self) -> Option<ResultKey> {
        self.school.map(|school| ResultKey {
            school,
            period: self.period,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_result_fields_are_never_mapped() {
        let unmapped = RESULT_SCHEMA
            .fields
            .iter()
            .filter(|field| !field.is_mapped())
            .map(|field| field.name)
            .collect::<Vec<_>>();
        assert_eq!(
            unmapped,
            vec!["period", "ranking_score", "ranking_score_wma", "rank"]
        );
    }

    #[test]
    fn school_type_reads_the_type_column() {
        let field = SCHOOL_SCHEMA.field("school_type").unwrap();
        assert_eq!(field.tag, "type");
    }

    #[test]
    fn result_key_requires_a_school() {
        let mut result = ExamResult {
            period: 2015,
            ..ExamResult::default()
        };
        assert_eq!(result.key(), None);
        let id = Uuid::new_v4();
        result.school = Some(id);
        assert_eq!(
            result.key(),
            Some(ResultKey {
                school: id,
                period: 2015
            })
        );
    }
}
