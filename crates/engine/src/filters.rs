//! Listing filters.
//!
//! Every listing has an explicit predicate table mapping a query parameter to
//! the column it constrains and how it is compared. Supplied parameters are
//! AND-ed; absent or empty ones are ignored. Courses and students match
//! group/section exactly while attendance matches them as case-insensitive
//! substrings.

use sea_orm::{
    QueryFilter, QuerySelect, QueryTrait,
    prelude::*,
    sea_query::{Expr, Func, LikeExpr, SelectStatement, SimpleExpr},
};
use serde::Deserialize;

use crate::{identities, professors, students, util::escape_like};

/// How a parameter is compared against its column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-sensitive equality.
    Exact,
    /// Case-insensitive substring.
    Contains,
}

/// Logical column a parameter refers to, resolved per listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    Module,
    GroupName,
    SectionName,
    ProfessorEmail,
    PresentStatus,
    StudentEmail,
    CourseId,
}

/// One row of a predicate table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    pub param: &'static str,
    pub field: FilterField,
    pub kind: MatchKind,
}

const fn entry(param: &'static str, field: FilterField, kind: MatchKind) -> FilterSpec {
    FilterSpec { param, field, kind }
}

pub const COURSE_FILTERS: &[FilterSpec] = &[
    entry("module", FilterField::Module, MatchKind::Exact),
    entry("group_name", FilterField::GroupName, MatchKind::Exact),
    entry("professor_email", FilterField::ProfessorEmail, MatchKind::Exact),
    entry("section_name", FilterField::SectionName, MatchKind::Exact),
];

pub const STUDENT_FILTERS: &[FilterSpec] = &[
    entry("group_name", FilterField::GroupName, MatchKind::Exact),
    entry("section_name", FilterField::SectionName, MatchKind::Exact),
];

pub const PROFESSOR_FILTERS: &[FilterSpec] =
    &[entry("module", FilterField::Module, MatchKind::Exact)];

pub const ATTENDANCE_FILTERS: &[FilterSpec] = &[
    entry("group_name", FilterField::GroupName, MatchKind::Contains),
    entry("section_name", FilterField::SectionName, MatchKind::Contains),
    entry("professor_email", FilterField::ProfessorEmail, MatchKind::Exact),
    entry("module_name", FilterField::Module, MatchKind::Exact),
    entry("present_status", FilterField::PresentStatus, MatchKind::Exact),
    entry("student_email", FilterField::StudentEmail, MatchKind::Exact),
    entry("course_id", FilterField::CourseId, MatchKind::Exact),
];

/// A supplied parameter resolved against its table row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterTerm<'a> {
    pub field: FilterField,
    pub kind: MatchKind,
    pub value: &'a str,
}

/// A typed set of listing parameters backed by a predicate table.
pub trait ListFilter {
    const TABLE: &'static [FilterSpec];

    /// Raw value supplied for `param`, if any.
    fn value(&self, param: &str) -> Option<&str>;

    /// Supplied, non-empty parameters in table order.
    fn terms(&self) -> Vec<FilterTerm<'_>> {
        Self::TABLE
            .iter()
            .filter_map(|entry| {
                self.value(entry.param)
                    .filter(|value| !value.is_empty())
                    .map(|value| FilterTerm {
                        field: entry.field,
                        kind: entry.kind,
                        value,
                    })
            })
            .collect()
    }
}

/// `/home/courses/` parameters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CourseFilter {
    pub module: Option<String>,
    pub group_name: Option<String>,
    pub professor_email: Option<String>,
    pub section_name: Option<String>,
}

impl ListFilter for CourseFilter {
    const TABLE: &'static [FilterSpec] = COURSE_FILTERS;

    fn value(&self, param: &str) -> Option<&str> {
        match param {
            "module" => self.module.as_deref(),
            "group_name" => self.group_name.as_deref(),
            "professor_email" => self.professor_email.as_deref(),
            "section_name" => self.section_name.as_deref(),
            _ => None,
        }
    }
}

/// `/home/students/` parameters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StudentFilter {
    pub group_name: Option<String>,
    pub section_name: Option<String>,
}

impl ListFilter for StudentFilter {
    const TABLE: &'static [FilterSpec] = STUDENT_FILTERS;

    fn value(&self, param: &str) -> Option<&str> {
        match param {
            "group_name" => self.group_name.as_deref(),
            "section_name" => self.section_name.as_deref(),
            _ => None,
        }
    }
}

/// `/home/professors/` parameters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfessorFilter {
    pub module: Option<String>,
}

impl ListFilter for ProfessorFilter {
    const TABLE: &'static [FilterSpec] = PROFESSOR_FILTERS;

    fn value(&self, param: &str) -> Option<&str> {
        match param {
            "module" => self.module.as_deref(),
            _ => None,
        }
    }
}

/// `/home/attendance/` parameters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AttendanceFilter {
    pub group_name: Option<String>,
    pub section_name: Option<String>,
    pub professor_email: Option<String>,
    pub module_name: Option<String>,
    pub present_status: Option<String>,
    pub student_email: Option<String>,
    /// Kept as text so a non-numeric value surfaces as a field error.
    pub course_id: Option<String>,
}

impl ListFilter for AttendanceFilter {
    const TABLE: &'static [FilterSpec] = ATTENDANCE_FILTERS;

    fn value(&self, param: &str) -> Option<&str> {
        match param {
            "group_name" => self.group_name.as_deref(),
            "section_name" => self.section_name.as_deref(),
            "professor_email" => self.professor_email.as_deref(),
            "module_name" => self.module_name.as_deref(),
            "present_status" => self.present_status.as_deref(),
            "student_email" => self.student_email.as_deref(),
            "course_id" => self.course_id.as_deref(),
            _ => None,
        }
    }
}

/// Compare `column` with `value` according to `kind`.
pub(crate) fn matches<C: ColumnTrait>(column: C, kind: MatchKind, value: &str) -> SimpleExpr {
    match kind {
        MatchKind::Exact => column.eq(value),
        MatchKind::Contains => {
            let pattern = format!("%{}%", escape_like(&value.to_lowercase()));
            Expr::expr(Func::lower(Expr::col(column.as_column_ref())))
                .like(LikeExpr::new(pattern).escape('\\'))
        }
    }
}

/// `SELECT id FROM groups WHERE <column matches value>`.
pub(crate) fn group_ids<C: ColumnTrait>(column: C, kind: MatchKind, value: &str) -> SelectStatement {
    crate::groups::Entity::find()
        .select_only()
        .column(crate::groups::Column::Id)
        .filter(matches(column, kind, value))
        .into_query()
}

fn identity_ids_by_email(kind: MatchKind, value: &str) -> SelectStatement {
    identities::Entity::find()
        .select_only()
        .column(identities::Column::Id)
        .filter(matches(identities::Column::Email, kind, value))
        .into_query()
}

/// `SELECT id FROM professors` whose identity email matches.
pub(crate) fn professor_ids_by_email(kind: MatchKind, value: &str) -> SelectStatement {
    professors::Entity::find()
        .select_only()
        .column(professors::Column::Id)
        .filter(professors::Column::UserId.in_subquery(identity_ids_by_email(kind, value)))
        .into_query()
}

/// `SELECT id FROM students` whose identity email matches.
pub(crate) fn student_ids_by_email(kind: MatchKind, value: &str) -> SelectStatement {
    students::Entity::find()
        .select_only()
        .column(students::Column::Id)
        .filter(students::Column::UserId.in_subquery(identity_ids_by_email(kind, value)))
        .into_query()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_missing_parameters_are_ignored() {
        let filter = CourseFilter {
            module: Some(String::new()),
            section_name: Some("A".to_string()),
            ..Default::default()
        };
        assert_eq!(
            filter.terms(),
            vec![FilterTerm {
                field: FilterField::SectionName,
                kind: MatchKind::Exact,
                value: "A",
            }]
        );
        assert!(CourseFilter::default().terms().is_empty());
    }

    #[test]
    fn attendance_matches_group_and_section_by_substring() {
        let filter = AttendanceFilter {
            group_name: Some("g1".to_string()),
            section_name: Some("a".to_string()),
            professor_email: Some("p@esi-sba.dz".to_string()),
            ..Default::default()
        };
        let kinds: Vec<_> = filter.terms().iter().map(|t| (t.field, t.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (FilterField::GroupName, MatchKind::Contains),
                (FilterField::SectionName, MatchKind::Contains),
                (FilterField::ProfessorEmail, MatchKind::Exact),
            ]
        );
    }

    #[test]
    fn courses_and_students_match_group_and_section_exactly() {
        for table in [COURSE_FILTERS, STUDENT_FILTERS] {
            for entry in table {
                assert_eq!(entry.kind, MatchKind::Exact, "{}", entry.param);
            }
        }
    }

    #[test]
    fn every_table_param_has_an_accessor() {
        let course = CourseFilter {
            module: Some("m".into()),
            group_name: Some("m".into()),
            professor_email: Some("m".into()),
            section_name: Some("m".into()),
        };
        assert_eq!(course.terms().len(), COURSE_FILTERS.len());

        let attendance = AttendanceFilter {
            group_name: Some("m".into()),
            section_name: Some("m".into()),
            professor_email: Some("m".into()),
            module_name: Some("m".into()),
            present_status: Some("m".into()),
            student_email: Some("m".into()),
            course_id: Some("1".into()),
        };
        assert_eq!(attendance.terms().len(), ATTENDANCE_FILTERS.len());
    }
}
