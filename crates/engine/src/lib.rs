//! Attendance engine: entities, validation and every operation the HTTP layer
//! and the admin CLI run against the database.

pub use attendance::{Attendance, AttendanceChanges, NewAttendance};
pub use courses::{Course, CourseChanges, NewCourse};
pub use error::EngineError;
pub use filters::{AttendanceFilter, CourseFilter, ListFilter, ProfessorFilter, StudentFilter};
pub use groups::{Group, GroupChanges, NewGroup};
pub use identities::{Identity, IdentityChanges, NewIdentity};
pub use ops::{Engine, EngineBuilder};
pub use professors::{Professor, ProfessorChanges};
pub use role::Role;
pub use students::{Student, StudentChanges};
pub use util::{ALLOWED_EMAIL_DOMAINS, username_from_email, validate_email};

pub mod attendance;
pub mod courses;
mod credentials;
mod error;
pub mod filters;
pub mod groups;
pub mod identities;
mod ops;
pub mod professors;
mod role;
pub mod students;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
