//! Roles, permissions, and the pure access evaluation over them.
//!
//! A member's effective permissions are always the deduplicated union of the
//! permissions of all roles currently assigned to that member. There is no
//! deny semantics and no precedence between roles; any role granting a
//! permission is sufficient.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mixdown_core::{AppError, WorkspaceId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permissions enforced by application policy checks.
///
/// The set is closed: unknown identifiers cannot be represented and transport
/// parsing rejects them, so an unrecognized permission can never match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Allows reading a workspace, its members, invites, and subscription.
    ViewTeam,
    /// Allows renaming a workspace and managing member roles.
    UpdateTeam,
    /// Allows deleting a workspace.
    DeleteTeam,
    /// Allows inviting new members to a workspace.
    InviteMembers,
    /// Allows revoking pending invites.
    DeleteInvites,
    /// Allows reading the artist catalog.
    ViewArtists,
    /// Allows adding artists to the catalog.
    CreateArtists,
    /// Allows updating artists.
    UpdateArtists,
    /// Allows removing artists.
    DeleteArtists,
    /// Allows reading releases and their tasks.
    ViewReleases,
    /// Allows creating releases.
    CreateReleases,
    /// Allows updating releases and their tasks.
    UpdateReleases,
    /// Allows deleting releases.
    DeleteReleases,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewTeam => "VIEW_TEAM",
            Self::UpdateTeam => "UPDATE_TEAM",
            Self::DeleteTeam => "DELETE_TEAM",
            Self::InviteMembers => "INVITE_MEMBERS",
            Self::DeleteInvites => "DELETE_INVITES",
            Self::ViewArtists => "VIEW_ARTISTS",
            Self::CreateArtists => "CREATE_ARTISTS",
            Self::UpdateArtists => "UPDATE_ARTISTS",
            Self::DeleteArtists => "DELETE_ARTISTS",
            Self::ViewReleases => "VIEW_RELEASES",
            Self::CreateReleases => "CREATE_RELEASES",
            Self::UpdateReleases => "UPDATE_RELEASES",
            Self::DeleteReleases => "DELETE_RELEASES",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ViewTeam,
            Permission::UpdateTeam,
            Permission::DeleteTeam,
            Permission::InviteMembers,
            Permission::DeleteInvites,
            Permission::ViewArtists,
            Permission::CreateArtists,
            Permission::UpdateArtists,
            Permission::DeleteArtists,
            Permission::ViewReleases,
            Permission::CreateReleases,
            Permission::UpdateReleases,
            Permission::DeleteReleases,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "VIEW_TEAM" => Ok(Self::ViewTeam),
            "UPDATE_TEAM" => Ok(Self::UpdateTeam),
            "DELETE_TEAM" => Ok(Self::DeleteTeam),
            "INVITE_MEMBERS" => Ok(Self::InviteMembers),
            "DELETE_INVITES" => Ok(Self::DeleteInvites),
            "VIEW_ARTISTS" => Ok(Self::ViewArtists),
            "CREATE_ARTISTS" => Ok(Self::CreateArtists),
            "UPDATE_ARTISTS" => Ok(Self::UpdateArtists),
            "DELETE_ARTISTS" => Ok(Self::DeleteArtists),
            "VIEW_RELEASES" => Ok(Self::ViewReleases),
            "CREATE_RELEASES" => Ok(Self::CreateReleases),
            "UPDATE_RELEASES" => Ok(Self::UpdateReleases),
            "DELETE_RELEASES" => Ok(Self::DeleteReleases),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// A named, reusable bundle of permissions assignable to members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: Uuid,
    /// Role name, unique within its workspace.
    pub name: String,
    /// Whether the role belongs to the seeded catalog.
    pub is_system: bool,
    /// Permissions granted by this role.
    pub permissions: BTreeSet<Permission>,
}

/// A user's association with a workspace, carrying zero or more roles.
///
/// The roles collection arrives fully populated from the membership
/// repository; nothing in this module fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    /// Membership identifier.
    pub id: Uuid,
    /// Workspace this membership belongs to.
    pub workspace_id: WorkspaceId,
    /// Stable subject of the member's user identity.
    pub subject: String,
    /// Display name of the underlying user, when known.
    pub display_name: Option<String>,
    /// Email of the underlying user, when known.
    pub email: Option<String>,
    /// Roles currently assigned to the member.
    pub roles: Vec<Role>,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

/// Collapses a member's roles into a deduplicated set of permissions.
///
/// An absent member, or a member with no roles, yields the empty set; this
/// never fails. The result is a pure projection of the input and carries each
/// permission once however many roles grant it.
#[must_use]
pub fn effective_permissions(member: Option<&WorkspaceMember>) -> BTreeSet<Permission> {
    let Some(member) = member else {
        return BTreeSet::new();
    };

    member
        .roles
        .iter()
        .flat_map(|role| role.permissions.iter().copied())
        .collect()
}

/// Decides whether a member may perform an operation requiring `required`.
///
/// ANY-match semantics: holding at least one of the required permissions
/// passes. An absent member is denied, as is an empty required list. Total
/// over its inputs; never panics.
#[must_use]
pub fn has_required_permissions(
    required: &[Permission],
    member: Option<&WorkspaceMember>,
) -> bool {
    if member.is_none() {
        return false;
    }

    let held = effective_permissions(member);
    required.iter().any(|permission| held.contains(permission))
}

/// Name and permission set of each role seeded into a new workspace.
///
/// Admin holds everything, Editor manages the catalogs without touching
/// workspace settings, and Viewer is read-only.
#[must_use]
pub fn seeded_role_catalog() -> Vec<(&'static str, BTreeSet<Permission>)> {
    vec![
        ("Admin", Permission::all().iter().copied().collect()),
        (
            "Editor",
            BTreeSet::from([
                Permission::ViewTeam,
                Permission::InviteMembers,
                Permission::ViewArtists,
                Permission::CreateArtists,
                Permission::UpdateArtists,
                Permission::DeleteArtists,
                Permission::ViewReleases,
                Permission::CreateReleases,
                Permission::UpdateReleases,
                Permission::DeleteReleases,
            ]),
        ),
        (
            "Viewer",
            BTreeSet::from([
                Permission::ViewTeam,
                Permission::ViewArtists,
                Permission::ViewReleases,
            ]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::str::FromStr;

    use chrono::Utc;
    use mixdown_core::WorkspaceId;
    use uuid::Uuid;

    use super::{
        Permission, Role, WorkspaceMember, effective_permissions, has_required_permissions,
    };

    fn role(name: &str, permissions: &[Permission]) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            is_system: false,
            permissions: permissions.iter().copied().collect(),
        }
    }

    fn member_with(roles: Vec<Role>) -> WorkspaceMember {
        WorkspaceMember {
            id: Uuid::new_v4(),
            workspace_id: WorkspaceId::new(),
            subject: "user-1".to_owned(),
            display_name: Some("Test User".to_owned()),
            email: Some("user@example.com".to_owned()),
            roles,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn permission_roundtrip_storage_value() {
        let permission = Permission::UpdateReleases;
        let restored = Permission::from_str(permission.as_str());
        assert!(restored.is_ok());
        assert_eq!(restored.unwrap_or(Permission::ViewTeam), permission);
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let parsed = Permission::from_str("LAUNCH_ROCKETS");
        assert!(parsed.is_err());
    }

    #[test]
    fn member_without_roles_has_no_permissions() {
        let member = member_with(Vec::new());
        assert!(effective_permissions(Some(&member)).is_empty());
        assert!(!has_required_permissions(
            &[Permission::ViewTeam],
            Some(&member)
        ));
    }

    #[test]
    fn duplicate_grants_collapse_to_one() {
        let member = member_with(vec![
            role("Editor", &[Permission::UpdateReleases, Permission::ViewTeam]),
            role("Reviewer", &[Permission::UpdateReleases]),
        ]);

        let held = effective_permissions(Some(&member));
        assert_eq!(held.len(), 2);
        assert!(held.contains(&Permission::UpdateReleases));
        assert!(held.contains(&Permission::ViewTeam));
    }

    #[test]
    fn any_one_required_permission_passes() {
        let member = member_with(vec![role("Viewer", &[Permission::ViewTeam])]);

        assert!(has_required_permissions(
            &[Permission::DeleteTeam, Permission::ViewTeam],
            Some(&member)
        ));
    }

    #[test]
    fn absent_member_is_denied() {
        assert!(!has_required_permissions(&[Permission::ViewTeam], None));
        assert!(effective_permissions(None).is_empty());
    }

    #[test]
    fn empty_required_list_is_denied() {
        let member = member_with(vec![role("Admin", Permission::all())]);
        assert!(!has_required_permissions(&[], Some(&member)));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let member = member_with(vec![
            role("Editor", &[Permission::UpdateReleases]),
            role("Viewer", &[Permission::ViewTeam, Permission::ViewReleases]),
        ]);

        let first = effective_permissions(Some(&member));
        let second = effective_permissions(Some(&member));
        assert_eq!(first, second);
    }

    #[test]
    fn seeded_catalog_covers_every_permission() {
        let catalog = super::seeded_role_catalog();
        assert_eq!(catalog.len(), 3);

        let admin = catalog
            .iter()
            .find(|(name, _)| *name == "Admin")
            .map(|(_, permissions)| permissions.clone())
            .unwrap_or_default();
        assert_eq!(admin.len(), Permission::all().len());

        let viewer = catalog
            .iter()
            .find(|(name, _)| *name == "Viewer")
            .map(|(_, permissions)| permissions.clone())
            .unwrap_or_default();
        assert!(viewer.contains(&Permission::ViewTeam));
        assert!(!viewer.contains(&Permission::DeleteTeam));
    }

    #[test]
    fn editor_and_viewer_scenario() {
        let member = member_with(vec![
            role("Editor", &[Permission::UpdateReleases]),
            role("Viewer", &[Permission::ViewTeam]),
        ]);

        assert!(has_required_permissions(
            &[Permission::UpdateReleases],
            Some(&member)
        ));
        assert!(!has_required_permissions(
            &[Permission::DeleteTeam],
            Some(&member)
        ));
        assert!(has_required_permissions(
            &[Permission::DeleteTeam, Permission::ViewTeam],
            Some(&member)
        ));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn arb_permission() -> impl Strategy<Value = Permission> {
            proptest::sample::select(Permission::all().to_vec())
        }

        fn arb_member() -> impl Strategy<Value = WorkspaceMember> {
            proptest::collection::vec(
                proptest::collection::btree_set(arb_permission(), 0..6),
                0..5,
            )
            .prop_map(|role_sets| {
                let roles = role_sets
                    .into_iter()
                    .enumerate()
                    .map(|(index, permissions)| Role {
                        id: Uuid::new_v4(),
                        name: format!("role-{index}"),
                        is_system: false,
                        permissions,
                    })
                    .collect();
                member_with(roles)
            })
        }

        proptest! {
            #[test]
            fn effective_set_is_union_of_role_sets(member in arb_member()) {
                let expected: BTreeSet<Permission> = member
                    .roles
                    .iter()
                    .flat_map(|role| role.permissions.iter().copied())
                    .collect();
                prop_assert_eq!(effective_permissions(Some(&member)), expected);
            }

            #[test]
            fn aggregation_is_stable_across_calls(member in arb_member()) {
                prop_assert_eq!(
                    effective_permissions(Some(&member)),
                    effective_permissions(Some(&member))
                );
            }

            #[test]
            fn gate_agrees_with_membership_test(
                member in arb_member(),
                required in proptest::collection::vec(arb_permission(), 0..6),
            ) {
                let held = effective_permissions(Some(&member));
                let expected = required.iter().any(|permission| held.contains(permission));
                prop_assert_eq!(has_required_permissions(&required, Some(&member)), expected);
            }

            #[test]
            fn gate_always_denies_absent_member(
                required in proptest::collection::vec(arb_permission(), 0..6),
            ) {
                prop_assert!(!has_required_permissions(&required, None));
            }
        }
    }
}
