//! Role derivation.
//!
//! A role is never stored: it is computed from which profile rows reference an
//! identity, every time it is needed.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Student,
    Professor,
    Admin,
}

impl Role {
    /// Student wins over professor; an identity without profiles is an admin.
    pub fn of(has_student_profile: bool, has_professor_profile: bool) -> Self {
        if has_student_profile {
            Self::Student
        } else if has_professor_profile {
            Self::Professor
        } else {
            Self::Admin
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Professor => "professor",
            Self::Admin => "admin",
        }
    }
}
