// src/services/membership.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

/// Quem entra na kermesse ao convidar `user`: a criança e, se houver, o
/// responsável dela. Repetições não são filtradas.
pub fn members_to_add(user: &User) -> Result<Vec<Uuid>, AppError> {
    if user.role != Role::Child {
        return Err(AppError::UserNotChild);
    }

    let mut members = vec![user.id];
    if let Some(parent_id) = user.parent_id {
        members.push(parent_id);
    }
    Ok(members)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn user(role: Role, parent_id: Option<Uuid>, credit: i64) -> User {
        User {
            id: Uuid::new_v4(),
            parent_id,
            name: "Léa".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: String::new(),
            role,
            credit,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn child_with_parent_brings_the_parent() {
        let parent = user(Role::Parent, None, 0);
        let child = user(Role::Child, Some(parent.id), 0);

        assert_eq!(members_to_add(&child).unwrap(), vec![child.id, parent.id]);
    }

    #[test]
    fn child_without_parent_is_a_single_row() {
        let child = user(Role::Child, None, 0);
        assert_eq!(members_to_add(&child).unwrap(), vec![child.id]);
    }

    #[test]
    fn only_children_can_be_invited() {
        for role in [Role::Parent, Role::Organizer, Role::StandHolder] {
            let u = user(role, None, 0);
            assert!(matches!(members_to_add(&u), Err(AppError::UserNotChild)));
        }
    }
}
