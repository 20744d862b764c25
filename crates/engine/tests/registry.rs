use chrono::{TimeZone, Utc};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, Statement,
};

use engine::{
    AttendanceChanges, AttendanceFilter, CourseChanges, CourseFilter, Engine, EngineError,
    GroupChanges, IdentityChanges, NewAttendance, NewCourse, NewGroup, NewIdentity,
    ProfessorFilter, Role, StudentChanges, StudentFilter, identities, professors, students,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn person(email: &str) -> NewIdentity {
    NewIdentity {
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "Person".to_string(),
        password: Some("password".to_string()),
    }
}

fn course(name: &str, code: &str, professor_id: i32, group_id: Option<i32>) -> NewCourse {
    NewCourse {
        name: name.to_string(),
        code: code.to_string(),
        module: None,
        date_time: None,
        professor_id,
        group_id,
    }
}

async fn group(engine: &Engine, name: &str, section: &str) -> i32 {
    engine
        .create_group(NewGroup {
            name: Some(name.to_string()),
            section: section.to_string(),
        })
        .await
        .unwrap()
        .id
}

async fn count_identities(db: &DatabaseConnection) -> u64 {
    identities::Entity::find().count(db).await.unwrap()
}

#[tokio::test]
async fn schema_indexes_attendance_by_course_and_time() {
    let (_engine, db) = engine_with_db().await;
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'attendance'",
        ))
        .await
        .unwrap();
    let names: Vec<String> = rows
        .iter()
        .map(|row| row.try_get::<String>("", "name").unwrap())
        .collect();
    assert!(names.contains(&"idx-attendance-course_id-time".to_string()), "{names:?}");
    assert!(names.contains(&"idx-attendance-student_id".to_string()), "{names:?}");
}

#[tokio::test]
async fn student_registration_creates_identity_and_profile() {
    let (engine, db) = engine_with_db().await;
    let group_id = group(&engine, "G1", "A").await;

    let student = engine
        .register_student(person("jane.doe@esi-sba.dz"), Some(group_id))
        .await
        .unwrap();

    assert_eq!(student.identity.username, "jane.doe");
    assert_eq!(student.identity.full_name(), "Test Person");
    assert_eq!(student.group.as_ref().map(|g| g.id), Some(group_id));
    assert_eq!(count_identities(&db).await, 1);
    assert_eq!(students::Entity::find().count(&db).await.unwrap(), 1);
    assert_eq!(
        engine.role_of(student.identity.id).await.unwrap(),
        Role::Student
    );
}

#[tokio::test]
async fn registration_rejects_foreign_domain_without_side_effects() {
    let (engine, db) = engine_with_db().await;

    let err = engine
        .register_professor(person("prof@yahoo.com"), "Math")
        .await
        .unwrap_err();

    assert_eq!(err.field(), Some("email"));
    assert_eq!(count_identities(&db).await, 0);
    assert_eq!(professors::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn registration_rejects_taken_email_and_username() {
    let (engine, db) = engine_with_db().await;
    engine
        .register_student(person("ali@gmail.com"), None)
        .await
        .unwrap();

    let err = engine
        .register_professor(person("ali@gmail.com"), "Math")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExistingKey {
            field: "email".to_string(),
            message: "This email is already registered.".to_string(),
        }
    );

    let err = engine
        .register_student(person("ali@esi-sba.dz"), None)
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("username"));
    assert_eq!(count_identities(&db).await, 1);
}

#[tokio::test]
async fn failed_profile_insert_rolls_back_identity() {
    let (engine, db) = engine_with_db().await;

    let err = engine
        .register_student(person("lost@gmail.com"), Some(404))
        .await
        .unwrap_err();

    assert_eq!(err.field(), Some("student_group_id"));
    assert_eq!(count_identities(&db).await, 0);
}

#[tokio::test]
async fn roles_and_staff_capability() {
    let (engine, _db) = engine_with_db().await;
    let student = engine
        .register_student(person("s@gmail.com"), None)
        .await
        .unwrap();
    let professor = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let admin = engine.create_admin(person("root@gmail.com")).await.unwrap();

    assert_eq!(
        engine.role_of(professor.identity.id).await.unwrap(),
        Role::Professor
    );
    assert_eq!(engine.role_of(admin.id).await.unwrap(), Role::Admin);

    assert!(engine.require_staff(&professor.identity).await.is_ok());
    assert!(engine.require_staff(&admin).await.is_ok());
    assert!(matches!(
        engine.require_staff(&student.identity).await,
        Err(EngineError::Forbidden(_))
    ));

    let admins = engine.list_admins().await.unwrap();
    assert_eq!(admins, vec![admin]);
}

#[tokio::test]
async fn authenticate_by_username_or_email() {
    let (engine, _db) = engine_with_db().await;
    let professor = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let mut passwordless = person("nopass@gmail.com");
    passwordless.password = None;
    engine.register_student(passwordless, None).await.unwrap();

    let by_name = engine.authenticate("p", "password").await.unwrap();
    let by_email = engine.authenticate("p@esi-sba.dz", "password").await.unwrap();
    assert_eq!(by_name, professor.identity);
    assert_eq!(by_email, professor.identity);

    for (login, password) in [("p", "wrong"), ("ghost", "password"), ("nopass", "")] {
        let err = engine.authenticate(login, password).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidCredentials(
                "No active account found with the given credentials".to_string()
            )
        );
    }
}

#[tokio::test]
async fn student_update_revalidates_nested_identity() {
    let (engine, _db) = engine_with_db().await;
    let group_id = group(&engine, "G1", "A").await;
    engine
        .register_student(person("taken@gmail.com"), None)
        .await
        .unwrap();
    let student = engine
        .register_student(person("me@gmail.com"), Some(group_id))
        .await
        .unwrap();

    let err = engine
        .update_student(
            student.id,
            StudentChanges {
                identity: Some(IdentityChanges {
                    email: Some("taken@gmail.com".to_string()),
                    ..Default::default()
                }),
                group_id: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("email"));

    let updated = engine
        .update_student(
            student.id,
            StudentChanges {
                identity: Some(IdentityChanges {
                    email: Some("renamed@esi-sba.dz".to_string()),
                    first_name: Some("Nora".to_string()),
                    ..Default::default()
                }),
                group_id: Some(None),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.identity.email, "renamed@esi-sba.dz");
    assert_eq!(updated.identity.username, "renamed");
    assert_eq!(updated.identity.first_name, "Nora");
    assert_eq!(updated.identity.last_name, "Person");
    assert!(updated.group.is_none());
}

#[tokio::test]
async fn deleting_profiles_removes_identities_and_dependants() {
    let (engine, db) = engine_with_db().await;
    let student = engine
        .register_student(person("s@gmail.com"), None)
        .await
        .unwrap();
    let professor = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let course = engine
        .create_course(course("Algebra", "ALG1", professor.id, None))
        .await
        .unwrap();
    engine
        .create_attendance(NewAttendance {
            student_id: student.id,
            course_id: course.id,
            time: None,
            present_status: None,
        })
        .await
        .unwrap();

    engine.delete_student(student.id).await.unwrap();
    assert_eq!(count_identities(&db).await, 1);
    assert!(
        engine
            .list_attendance(&AttendanceFilter::default())
            .await
            .unwrap()
            .is_empty()
    );

    engine.delete_professor(professor.id).await.unwrap();
    assert_eq!(count_identities(&db).await, 0);
    assert!(matches!(
        engine.course(course.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.delete_professor(professor.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn deleting_group_cascades_to_courses_and_students() {
    let (engine, db) = engine_with_db().await;
    let group_id = group(&engine, "G1", "A").await;
    let other_id = group(&engine, "G2", "B").await;
    let professor = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let member = engine
        .register_student(person("in@gmail.com"), Some(group_id))
        .await
        .unwrap();
    let outsider = engine
        .register_student(person("out@gmail.com"), Some(other_id))
        .await
        .unwrap();
    let course = engine
        .create_course(course("Algebra", "ALG1", professor.id, Some(group_id)))
        .await
        .unwrap();
    engine
        .create_attendance(NewAttendance {
            student_id: outsider.id,
            course_id: course.id,
            time: None,
            present_status: None,
        })
        .await
        .unwrap();

    engine.delete_group(group_id).await.unwrap();

    assert!(matches!(
        engine.student(member.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(engine.student(outsider.id).await.is_ok());
    assert!(matches!(
        engine.course(course.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(
        engine
            .list_attendance(&AttendanceFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
    // professor + outsider
    assert_eq!(count_identities(&db).await, 2);
    assert_eq!(engine.list_groups().await.unwrap().len(), 1);
}

#[tokio::test]
async fn group_defaults_and_updates() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_group(NewGroup {
            name: None,
            section: "A".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(created.name, "DefaultGroupName");

    let updated = engine
        .update_group(
            created.id,
            GroupChanges {
                name: Some("G7".to_string()),
                section: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "G7");
    assert_eq!(updated.section, "A");

    let err = engine
        .create_group(NewGroup {
            name: Some("x".repeat(51)),
            section: "A".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("name"));
}

#[tokio::test]
async fn duplicate_course_code_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let professor = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    engine
        .create_course(course("Algebra", "CS101", professor.id, None))
        .await
        .unwrap();

    let err = engine
        .create_course(course("Other", "CS101", professor.id, None))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExistingKey {
            field: "code".to_string(),
            message: "course with this code already exists.".to_string(),
        }
    );
    assert_eq!(
        engine
            .list_courses(&CourseFilter::default())
            .await
            .unwrap()
            .len(),
        1
    );

    let err = engine
        .create_course(course("Dangling", "CS102", 999, None))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidField {
            field: "professor_id".to_string(),
            message: "Invalid pk \"999\" - object does not exist.".to_string(),
        }
    );
}

#[tokio::test]
async fn course_update_keeps_own_code_and_applies_defaults() {
    let (engine, _db) = engine_with_db().await;
    let professor = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let created = engine
        .create_course(course("Algebra", "CS101", professor.id, None))
        .await
        .unwrap();
    assert_eq!(created.module, "DefaultModuleName");

    let when = Utc.with_ymd_and_hms(2025, 5, 5, 8, 30, 0).unwrap();
    let updated = engine
        .update_course(
            created.id,
            CourseChanges {
                code: Some("CS101".to_string()),
                module: Some("Math".to_string()),
                date_time: Some(Some(when)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.module, "Math");
    assert_eq!(updated.date_time, Some(when));
    assert_eq!(updated.professor, professor);
}

#[tokio::test]
async fn course_filters_are_exact_and_combined() {
    let (engine, _db) = engine_with_db().await;
    let section_a = group(&engine, "G1", "A").await;
    let section_ab = group(&engine, "G2", "AB").await;
    let p = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let q = engine
        .register_professor(person("q@esi-sba.dz"), "Physics")
        .await
        .unwrap();

    engine
        .create_course(course("Algebra", "C1", p.id, Some(section_a)))
        .await
        .unwrap();
    engine
        .create_course(course("Geometry", "C2", p.id, Some(section_ab)))
        .await
        .unwrap();
    engine
        .create_course(course("Optics", "C3", q.id, Some(section_a)))
        .await
        .unwrap();
    engine
        .create_course(course("Unassigned", "C4", p.id, None))
        .await
        .unwrap();

    let filter = CourseFilter {
        section_name: Some("A".to_string()),
        professor_email: Some("p@esi-sba.dz".to_string()),
        ..Default::default()
    };
    let codes: Vec<String> = engine
        .list_courses(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.code)
        .collect();
    assert_eq!(codes, vec!["C1".to_string()]);

    let all = engine.list_courses(&CourseFilter::default()).await.unwrap();
    let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Algebra", "Geometry", "Optics", "Unassigned"]);

    let lower = CourseFilter {
        section_name: Some("a".to_string()),
        ..Default::default()
    };
    assert!(engine.list_courses(&lower).await.unwrap().is_empty());
}

#[tokio::test]
async fn student_and_professor_filters() {
    let (engine, _db) = engine_with_db().await;
    let g1 = group(&engine, "G1", "A").await;
    let g2 = group(&engine, "G2", "B").await;
    let s1 = engine
        .register_student(person("s1@gmail.com"), Some(g1))
        .await
        .unwrap();
    engine
        .register_student(person("s2@gmail.com"), Some(g2))
        .await
        .unwrap();
    engine
        .register_student(person("s3@gmail.com"), None)
        .await
        .unwrap();
    engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();

    let filter = StudentFilter {
        group_name: Some("G1".to_string()),
        section_name: Some("A".to_string()),
    };
    let found = engine.list_students(&filter).await.unwrap();
    assert_eq!(found, vec![s1]);
    assert_eq!(
        engine
            .list_students(&StudentFilter::default())
            .await
            .unwrap()
            .len(),
        3
    );

    let math = ProfessorFilter {
        module: Some("Math".to_string()),
    };
    assert_eq!(engine.list_professors(&math).await.unwrap().len(), 1);
    let math_lower = ProfessorFilter {
        module: Some("math".to_string()),
    };
    assert!(engine.list_professors(&math_lower).await.unwrap().is_empty());
}

#[tokio::test]
async fn attendance_filters_use_substring_for_group_and_section() {
    let (engine, _db) = engine_with_db().await;
    let g1 = group(&engine, "Group-1", "Alpha").await;
    let g2 = group(&engine, "Group-2", "Beta").await;
    let p = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let s = engine
        .register_student(person("s@gmail.com"), Some(g1))
        .await
        .unwrap();
    let c1 = engine
        .create_course(course("Algebra", "C1", p.id, Some(g1)))
        .await
        .unwrap();
    let c2 = engine
        .create_course(course("Geometry", "C2", p.id, Some(g2)))
        .await
        .unwrap();
    for (course_id, status) in [(c1.id, "Present"), (c2.id, "Absent")] {
        engine
            .create_attendance(NewAttendance {
                student_id: s.id,
                course_id,
                time: None,
                present_status: Some(status.to_string()),
            })
            .await
            .unwrap();
    }

    let by_group = AttendanceFilter {
        group_name: Some("group-1".to_string()),
        ..Default::default()
    };
    let records = engine.list_attendance(&by_group).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].course.id, c1.id);

    let by_section = AttendanceFilter {
        section_name: Some("ET".to_string()),
        student_email: Some("s@gmail.com".to_string()),
        ..Default::default()
    };
    let records = engine.list_attendance(&by_section).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].course.id, c2.id);

    let wildcard = AttendanceFilter {
        group_name: Some("%".to_string()),
        ..Default::default()
    };
    assert!(engine.list_attendance(&wildcard).await.unwrap().is_empty());

    let combined = AttendanceFilter {
        professor_email: Some("p@esi-sba.dz".to_string()),
        module_name: Some("DefaultModuleName".to_string()),
        present_status: Some("Absent".to_string()),
        course_id: Some(c2.id.to_string()),
        ..Default::default()
    };
    assert_eq!(engine.list_attendance(&combined).await.unwrap().len(), 1);

    let bad = AttendanceFilter {
        course_id: Some("abc".to_string()),
        ..Default::default()
    };
    assert_eq!(
        engine.list_attendance(&bad).await.unwrap_err(),
        EngineError::InvalidField {
            field: "course_id".to_string(),
            message: "Enter a number.".to_string(),
        }
    );
}

#[tokio::test]
async fn status_update_changes_only_the_status() {
    let (engine, _db) = engine_with_db().await;
    let p = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let s = engine
        .register_student(person("s@gmail.com"), None)
        .await
        .unwrap();
    let c = engine
        .create_course(course("Algebra", "C1", p.id, None))
        .await
        .unwrap();
    let when = Utc.with_ymd_and_hms(2025, 4, 20, 10, 0, 0).unwrap();
    let record = engine
        .create_attendance(NewAttendance {
            student_id: s.id,
            course_id: c.id,
            time: Some(when),
            present_status: None,
        })
        .await
        .unwrap();
    assert_eq!(record.present_status, "Absent");

    let updated = engine
        .update_attendance_status(record.id, Some("Present"))
        .await
        .unwrap();
    assert_eq!(updated.present_status, "Present");
    assert_eq!(updated.time, when);
    assert_eq!(updated.student, record.student);
    assert_eq!(updated.course, record.course);

    for missing in [None, Some("")] {
        let err = engine
            .update_attendance_status(record.id, missing)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::MissingField("present_status".to_string()));
    }
    assert_eq!(
        engine.attendance(record.id).await.unwrap().present_status,
        "Present"
    );

    let err = engine
        .update_attendance_status(999, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("attendance 999".to_string()));
}

#[tokio::test]
async fn status_update_stores_the_value_as_sent() {
    let (engine, _db) = engine_with_db().await;
    let p = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let s = engine
        .register_student(person("s@gmail.com"), None)
        .await
        .unwrap();
    let c = engine
        .create_course(course("Algebra", "C1", p.id, None))
        .await
        .unwrap();
    let record = engine
        .create_attendance(NewAttendance {
            student_id: s.id,
            course_id: c.id,
            time: None,
            present_status: None,
        })
        .await
        .unwrap();

    for raw in ["  Late ", "   "] {
        let updated = engine
            .update_attendance_status(record.id, Some(raw))
            .await
            .unwrap();
        assert_eq!(updated.present_status, raw);
    }

    let err = engine
        .update_attendance_status(record.id, Some(&"x".repeat(31)))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("present_status"));
}

#[tokio::test]
async fn attendance_update_and_delete() {
    let (engine, _db) = engine_with_db().await;
    let p = engine
        .register_professor(person("p@esi-sba.dz"), "Math")
        .await
        .unwrap();
    let s = engine
        .register_student(person("s@gmail.com"), None)
        .await
        .unwrap();
    let c1 = engine
        .create_course(course("Algebra", "C1", p.id, None))
        .await
        .unwrap();
    let c2 = engine
        .create_course(course("Geometry", "C2", p.id, None))
        .await
        .unwrap();
    let record = engine
        .create_attendance(NewAttendance {
            student_id: s.id,
            course_id: c1.id,
            time: None,
            present_status: Some("late".to_string()),
        })
        .await
        .unwrap();

    let moved = engine
        .update_attendance(
            record.id,
            AttendanceChanges {
                course_id: Some(c2.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.course.id, c2.id);
    assert_eq!(moved.present_status, "late");

    let err = engine
        .update_attendance(
            record.id,
            AttendanceChanges {
                student_id: Some(77),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("student_id"));

    engine.delete_attendance(record.id).await.unwrap();
    assert_eq!(
        engine.delete_attendance(record.id).await.unwrap_err(),
        EngineError::KeyNotFound(format!("attendance {}", record.id))
    );
}
