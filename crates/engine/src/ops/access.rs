use sea_orm::{QueryFilter, prelude::*};

use crate::{EngineError, Identity, ResultEngine, Role, professors, students};

use super::Engine;

impl Engine {
    async fn has_student_profile(&self, identity_id: i32) -> ResultEngine<bool> {
        Ok(students::Entity::find()
            .filter(students::Column::UserId.eq(identity_id))
            .one(&self.database)
            .await?
            .is_some())
    }

    async fn has_professor_profile(&self, identity_id: i32) -> ResultEngine<bool> {
        Ok(professors::Entity::find()
            .filter(professors::Column::UserId.eq(identity_id))
            .one(&self.database)
            .await?
            .is_some())
    }

    /// Derive the role of an identity from its current profile rows.
    pub async fn role_of(&self, identity_id: i32) -> ResultEngine<Role> {
        let has_student = self.has_student_profile(identity_id).await?;
        let has_professor = self.has_professor_profile(identity_id).await?;
        Ok(Role::of(has_student, has_professor))
    }

    /// Staff capability: admin flag or a professor profile.
    pub async fn is_staff(&self, identity: &Identity) -> ResultEngine<bool> {
        if identity.is_admin {
            return Ok(true);
        }
        self.has_professor_profile(identity.id).await
    }

    /// Fail with `Forbidden` unless the identity is staff.
    pub async fn require_staff(&self, identity: &Identity) -> ResultEngine<()> {
        if !self.is_staff(identity).await? {
            tracing::debug!(identity = identity.id, "staff capability denied");
            return Err(EngineError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ));
        }
        Ok(())
    }
}
