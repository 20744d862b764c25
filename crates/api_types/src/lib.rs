use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod group {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: i32,
        pub name: String,
        pub section: String,
    }

    /// Body for `POST` and `PUT`. A missing `name` falls back to the default
    /// group name on create.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupWrite {
        pub name: Option<String>,
        pub section: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GroupPatch {
        pub name: Option<String>,
        pub section: Option<String>,
    }
}

pub mod user {
    use super::*;

    /// Identity as nested in every profile representation, and the entries
    /// of `GET /admins/`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub email: String,
        pub first_name: String,
        pub last_name: String,
        pub full_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserWrite {
        pub email: String,
        pub first_name: String,
        pub last_name: String,
        /// Without a password the account cannot obtain tokens.
        pub password: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserPatch {
        pub email: Option<String>,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub password: Option<String>,
    }
}

pub mod student {
    use super::{group::GroupView, user::*, *};

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct StudentView {
        pub id: i32,
        pub user: UserView,
        pub student_group: Option<GroupView>,
    }

    /// Body for registration, `POST` and `PUT`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct StudentWrite {
        pub user: UserWrite,
        pub student_group_id: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StudentPatch {
        pub user: Option<UserPatch>,
        pub student_group_id: Option<i32>,
    }
}

pub mod professor {
    use super::{user::*, *};

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProfessorView {
        pub id: i32,
        pub user: UserView,
        pub module: String,
    }

    /// Body for registration, `POST` and `PUT`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfessorWrite {
        pub user: UserWrite,
        pub module: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfessorPatch {
        pub user: Option<UserPatch>,
        pub module: Option<String>,
    }
}

pub mod course {
    use super::{group::GroupView, professor::ProfessorView, *};

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CourseView {
        pub id: i32,
        pub name: String,
        pub code: String,
        /// RFC3339 timestamp (UTC).
        pub date_time: Option<DateTime<Utc>>,
        pub module: String,
        pub professor: ProfessorView,
        pub group: Option<GroupView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CourseWrite {
        pub name: String,
        pub code: String,
        pub date_time: Option<DateTime<Utc>>,
        pub module: Option<String>,
        pub professor_id: i32,
        pub group_id: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CoursePatch {
        pub name: Option<String>,
        pub code: Option<String>,
        pub date_time: Option<DateTime<Utc>>,
        pub module: Option<String>,
        pub professor_id: Option<i32>,
        pub group_id: Option<i32>,
    }
}

pub mod attendance {
    use super::{course::CourseView, student::StudentView, *};

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AttendanceView {
        pub id: i32,
        pub student: StudentView,
        pub course: CourseView,
        pub present_status: String,
        pub time: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AttendanceWrite {
        pub student_id: i32,
        pub course_id: i32,
        /// Defaults to `Absent`.
        pub present_status: Option<String>,
        /// Defaults to the time of the request.
        pub time: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AttendancePatch {
        pub student_id: Option<i32>,
        pub course_id: Option<i32>,
        pub present_status: Option<String>,
        pub time: Option<DateTime<Utc>>,
    }

    /// Body of `PATCH /home/attendance/{id}/update-status/`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StatusUpdate {
        #[serde(default)]
        pub present_status: Option<String>,
    }
}

pub mod auth {
    use super::*;

    /// `POST /user/token/`; `username` also accepts an email.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenObtain {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenPair {
        pub access: String,
        pub refresh: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenRefresh {
        pub refresh: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccessToken {
        pub access: String,
    }
}
