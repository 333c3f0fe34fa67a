// src/services/lifecycle.rs
//
// Regras de estado da kermesse: STARTED -> ENDED, sem volta.

use crate::{
    common::error::AppError,
    models::{
        auth::Principal,
        kermesse::{Kermesse, KermesseStatus},
    },
};

/// Toda mutação ligada à kermesse passa por aqui antes de escrever.
pub fn ensure_mutable(kermesse: &Kermesse) -> Result<(), AppError> {
    if kermesse.status == KermesseStatus::Ended {
        tracing::warn!("Tentativa de alterar a kermesse encerrada {}", kermesse.id);
        return Err(AppError::KermesseEnded);
    }
    Ok(())
}

pub fn ensure_organizer(kermesse: &Kermesse, principal: &Principal) -> Result<(), AppError> {
    if kermesse.user_id != principal.id {
        return Err(AppError::Forbidden("apenas o organizador da kermesse"));
    }
    Ok(())
}

pub fn ensure_can_end(kermesse: &Kermesse, started_tombolas: i64) -> Result<(), AppError> {
    ensure_mutable(kermesse)?;
    if started_tombolas > 0 {
        return Err(AppError::KermesseHasOpenTombola);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::auth::Role;
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) fn kermesse(organizer: Uuid, status: KermesseStatus) -> Kermesse {
        Kermesse {
            id: Uuid::new_v4(),
            user_id: organizer,
            name: "Kermesse de Primavera".into(),
            description: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn ended_kermesse_rejects_mutation() {
        let k = kermesse(Uuid::new_v4(), KermesseStatus::Ended);
        assert!(matches!(ensure_mutable(&k), Err(AppError::KermesseEnded)));

        let k = kermesse(Uuid::new_v4(), KermesseStatus::Started);
        assert!(ensure_mutable(&k).is_ok());
    }

    #[test]
    fn only_the_organizer_passes() {
        let organizer = Principal { id: Uuid::new_v4(), role: Role::Organizer };
        let other = Principal { id: Uuid::new_v4(), role: Role::Organizer };
        let k = kermesse(organizer.id, KermesseStatus::Started);

        assert!(ensure_organizer(&k, &organizer).is_ok());
        assert!(matches!(ensure_organizer(&k, &other), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn open_tombola_blocks_the_end_until_it_is_finished() {
        let k = kermesse(Uuid::new_v4(), KermesseStatus::Started);
        assert!(matches!(ensure_can_end(&k, 1), Err(AppError::KermesseHasOpenTombola)));
        assert!(ensure_can_end(&k, 0).is_ok());
    }

    #[test]
    fn ending_twice_is_rejected() {
        let k = kermesse(Uuid::new_v4(), KermesseStatus::Ended);
        assert!(matches!(ensure_can_end(&k, 0), Err(AppError::KermesseEnded)));
    }
}
