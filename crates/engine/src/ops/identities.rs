use sea_orm::{
    ActiveValue, ConnectionTrait, Condition, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, Identity, IdentityChanges, NewIdentity, Professor, ResultEngine, Student,
    credentials::{password_for_storage, verify_password},
    error::UniqueKey,
    groups, identities, professors, students,
    util::{
        LABEL_MAX_LEN, PERSON_NAME_MAX_LEN, required_text, username_from_email, validate_email,
    },
};

use super::{
    Engine,
    loaders::{assemble_professors, assemble_students, require_reference, require_row, single},
    with_tx,
};

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";
const EMAIL_TAKEN: &str = "This email is already registered.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

const IDENTITY_KEYS: &[UniqueKey] = &[
    UniqueKey {
        column: "users.email",
        field: "email",
        message: EMAIL_TAKEN,
    },
    UniqueKey {
        column: "users.username",
        field: "username",
        message: USERNAME_TAKEN,
    },
];

/// Fail when `email` belongs to another identity than `except`.
async fn ensure_email_free<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except: Option<i32>,
) -> ResultEngine<()> {
    let mut query = identities::Entity::find().filter(identities::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(identities::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::existing("email", EMAIL_TAKEN));
    }
    Ok(())
}

async fn ensure_username_free<C: ConnectionTrait>(
    db: &C,
    username: &str,
    except: Option<i32>,
) -> ResultEngine<()> {
    let mut query = identities::Entity::find().filter(identities::Column::Username.eq(username));
    if let Some(id) = except {
        query = query.filter(identities::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::existing("username", USERNAME_TAKEN));
    }
    Ok(())
}

/// Validate and insert an identity row.
pub(super) async fn insert_identity<C: ConnectionTrait>(
    db: &C,
    identity: &NewIdentity,
    is_admin: bool,
) -> ResultEngine<identities::Model> {
    let email = validate_email(&identity.email)?;
    ensure_email_free(db, &email, None).await?;
    let username = username_from_email(&email);
    ensure_username_free(db, &username, None).await?;

    let first_name = required_text(&identity.first_name, "first_name", PERSON_NAME_MAX_LEN)?;
    let last_name = required_text(&identity.last_name, "last_name", PERSON_NAME_MAX_LEN)?;
    let password = password_for_storage(identity.password.as_deref())?;

    let active = identities::ActiveModel {
        email: ActiveValue::Set(email),
        username: ActiveValue::Set(username),
        first_name: ActiveValue::Set(first_name),
        last_name: ActiveValue::Set(last_name),
        password: ActiveValue::Set(password),
        is_admin: ActiveValue::Set(is_admin),
        ..Default::default()
    };
    active
        .insert(db)
        .await
        .map_err(|err| EngineError::from_db(err, IDENTITY_KEYS))
}

/// Apply a partial identity update. Changing the email re-derives the username.
pub(super) async fn update_identity<C: ConnectionTrait>(
    db: &C,
    identity_id: i32,
    changes: &IdentityChanges,
) -> ResultEngine<identities::Model> {
    let model = require_row::<identities::Entity, _>(db, identity_id, "identity").await?;
    let mut active: identities::ActiveModel = model.into();

    if let Some(raw) = changes.email.as_deref() {
        let email = validate_email(raw)?;
        ensure_email_free(db, &email, Some(identity_id)).await?;
        let username = username_from_email(&email);
        ensure_username_free(db, &username, Some(identity_id)).await?;
        active.email = ActiveValue::Set(email);
        active.username = ActiveValue::Set(username);
    }
    if let Some(raw) = changes.first_name.as_deref() {
        active.first_name =
            ActiveValue::Set(required_text(raw, "first_name", PERSON_NAME_MAX_LEN)?);
    }
    if let Some(raw) = changes.last_name.as_deref() {
        active.last_name = ActiveValue::Set(required_text(raw, "last_name", PERSON_NAME_MAX_LEN)?);
    }
    if let Some(raw) = changes.password.as_deref() {
        active.password = ActiveValue::Set(password_for_storage(Some(raw))?);
    }

    active
        .update(db)
        .await
        .map_err(|err| EngineError::from_db(err, IDENTITY_KEYS))
}

impl Engine {
    /// Create an identity and its student profile in one transaction.
    pub async fn register_student(
        &self,
        identity: NewIdentity,
        group_id: Option<i32>,
    ) -> ResultEngine<Student> {
        with_tx!(self, |db_tx| {
            let user = insert_identity(&db_tx, &identity, false).await?;
            if let Some(group_id) = group_id {
                require_reference::<groups::Entity, _>(&db_tx, group_id, "student_group_id")
                    .await?;
            }
            let model = students::ActiveModel {
                user_id: ActiveValue::Set(user.id),
                student_group_id: ActiveValue::Set(group_id),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(student = model.id, email = %user.email, "student registered");
            single(assemble_students(&db_tx, vec![model]).await?, "student")
        })
    }

    /// Create an identity and its professor profile in one transaction.
    pub async fn register_professor(
        &self,
        identity: NewIdentity,
        module: &str,
    ) -> ResultEngine<Professor> {
        with_tx!(self, |db_tx| {
            let user = insert_identity(&db_tx, &identity, false).await?;
            let module = required_text(module, "module", LABEL_MAX_LEN)?;
            let model = professors::ActiveModel {
                user_id: ActiveValue::Set(user.id),
                module: ActiveValue::Set(module),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(professor = model.id, email = %user.email, "professor registered");
            single(assemble_professors(&db_tx, vec![model]).await?, "professor")
        })
    }

    /// Create an identity with no profile and the admin flag set.
    pub async fn create_admin(&self, identity: NewIdentity) -> ResultEngine<Identity> {
        with_tx!(self, |db_tx| {
            let user = insert_identity(&db_tx, &identity, true).await?;
            tracing::info!(identity = user.id, email = %user.email, "admin created");
            Ok(Identity::from(user))
        })
    }

    /// Identities carrying the admin flag.
    pub async fn list_admins(&self) -> ResultEngine<Vec<Identity>> {
        Ok(identities::Entity::find()
            .filter(identities::Column::IsAdmin.eq(true))
            .order_by_asc(identities::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Identity::from)
            .collect())
    }

    pub async fn identity(&self, identity_id: i32) -> ResultEngine<Identity> {
        require_row::<identities::Entity, _>(&self.database, identity_id, "identity")
            .await
            .map(Identity::from)
    }

    pub async fn identity_by_email(&self, email: &str) -> ResultEngine<Identity> {
        identities::Entity::find()
            .filter(identities::Column::Email.eq(email.trim()))
            .one(&self.database)
            .await?
            .map(Identity::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("identity {}", email.trim())))
    }

    /// Check credentials; `login` is a username or an email.
    pub async fn authenticate(&self, login: &str, password: &str) -> ResultEngine<Identity> {
        let login = login.trim();
        let model = identities::Entity::find()
            .filter(
                Condition::any()
                    .add(identities::Column::Username.eq(login))
                    .add(identities::Column::Email.eq(login)),
            )
            .one(&self.database)
            .await?;

        match model {
            Some(model) if verify_password(password, &model.password) => {
                Ok(Identity::from(model))
            }
            _ => {
                tracing::debug!(login, "authentication failed");
                Err(EngineError::InvalidCredentials(
                    INVALID_CREDENTIALS.to_string(),
                ))
            }
        }
    }

    /// Promote or demote an existing identity.
    pub async fn set_admin(&self, identity_id: i32, is_admin: bool) -> ResultEngine<Identity> {
        with_tx!(self, |db_tx| {
            let model = require_row::<identities::Entity, _>(&db_tx, identity_id, "identity").await?;
            let mut active: identities::ActiveModel = model.into();
            active.is_admin = ActiveValue::Set(is_admin);
            let model = active.update(&db_tx).await?;
            tracing::info!(identity = identity_id, is_admin, "admin flag changed");
            Ok(Identity::from(model))
        })
    }
}
