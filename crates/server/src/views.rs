//! Engine records to their nested JSON representation.

use api_types::{
    attendance::AttendanceView,
    course::CourseView,
    group::GroupView,
    professor::ProfessorView,
    student::StudentView,
    user::UserView,
};
use engine::{Attendance, Course, Group, Identity, Professor, Student};

pub fn group(group: Group) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        section: group.section,
    }
}

pub fn user(identity: Identity) -> UserView {
    UserView {
        full_name: identity.full_name(),
        email: identity.email,
        first_name: identity.first_name,
        last_name: identity.last_name,
    }
}

pub fn student(student: Student) -> StudentView {
    StudentView {
        id: student.id,
        user: user(student.identity),
        student_group: student.group.map(group),
    }
}

pub fn professor(professor: Professor) -> ProfessorView {
    ProfessorView {
        id: professor.id,
        user: user(professor.identity),
        module: professor.module,
    }
}

pub fn course(course: Course) -> CourseView {
    CourseView {
        id: course.id,
        name: course.name,
        code: course.code,
        date_time: course.date_time,
        module: course.module,
        professor: professor(course.professor),
        group: course.group.map(group),
    }
}

pub fn attendance(record: Attendance) -> AttendanceView {
    AttendanceView {
        id: record.id,
        student: student(record.student),
        course: course(record.course),
        present_status: record.present_status,
        time: record.time,
    }
}
