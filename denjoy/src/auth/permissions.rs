//! Role checks.
//!
//! Two gates exist: platform administration (inquiries, invite codes) needs the `admin` role;
//! managing hospital members needs `master` or `admin` plus a hospital on the profile.

use crate::{
    auth::current_user::CurrentUser,
    db::models::profiles::{Profile, ProfileRole},
    errors::Error,
    types::{HospitalId, Operation, Resource},
};

pub fn is_platform_admin(user: &CurrentUser) -> bool {
    matches!(user.profile.as_ref().map(|p| p.role), Some(ProfileRole::Admin))
}

/// Require the platform `admin` role
pub fn require_platform_admin(user: &CurrentUser, action: Operation, resource: Resource) -> Result<&Profile, Error> {
    match &user.profile {
        Some(profile) if profile.role == ProfileRole::Admin => Ok(profile),
        _ => Err(Error::PermissionDenied { action, resource }),
    }
}

/// Require a hospital `master` (or platform admin) attached to a hospital. Returns that hospital.
pub fn require_hospital_manager(user: &CurrentUser) -> Result<(&Profile, HospitalId), Error> {
    let denied = || Error::PermissionDenied {
        action: Operation::Invite,
        resource: Resource::Members,
    };

    let profile = user.profile.as_ref().ok_or_else(denied)?;
    if !matches!(profile.role, ProfileRole::Master | ProfileRole::Admin) {
        return Err(denied());
    }
    let hospital_id = profile.hospital_id.ok_or_else(denied)?;

    Ok((profile, hospital_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: Option<ProfileRole>, hospital_id: Option<HospitalId>) -> CurrentUser {
        let id = Uuid::new_v4();
        CurrentUser {
            id,
            email: None,
            profile: role.map(|role| Profile {
                id,
                email: "someone@clinic.kr".to_string(),
                name: None,
                role,
                hospital_id,
            }),
        }
    }

    #[test]
    fn test_platform_admin() {
        assert!(require_platform_admin(&user(Some(ProfileRole::Admin), None), Operation::Read, Resource::Inquiries).is_ok());
        assert!(is_platform_admin(&user(Some(ProfileRole::Admin), None)));

        for role in [Some(ProfileRole::Master), Some(ProfileRole::Staff), None] {
            let err = require_platform_admin(&user(role, None), Operation::Read, Resource::Inquiries).unwrap_err();
            assert_eq!(err.error_code(), "permission_denied");
        }
    }

    #[test]
    fn test_hospital_manager_requires_role_and_hospital() {
        let hospital = Uuid::new_v4();

        let (_, found) = require_hospital_manager(&user(Some(ProfileRole::Master), Some(hospital))).unwrap();
        assert_eq!(found, hospital);
        assert!(require_hospital_manager(&user(Some(ProfileRole::Admin), Some(hospital))).is_ok());

        assert!(require_hospital_manager(&user(Some(ProfileRole::Staff), Some(hospital))).is_err());
        assert!(require_hospital_manager(&user(Some(ProfileRole::Master), None)).is_err());
        assert!(require_hospital_manager(&user(None, None)).is_err());
    }
}
