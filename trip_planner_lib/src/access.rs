use crate::trip::Trip;
use crate::user::{UserPublic, UserRole};

/// Permission predicates over a trip snapshot and the acting user. Every
/// decision is recomputed from the snapshot passed in; nothing is cached
/// between calls.
impl Trip {
    /// Owner, collaborators and members can see the trip. Admins can see
    /// every trip, related or not.
    pub fn can_view(&self, user: &UserPublic) -> bool {
        user.role == UserRole::Admin
            || user.user_id == self.owner_id
            || self.collaborator_ids.contains(&user.user_id)
            || self.member_ids.contains(&user.user_id)
    }

    /// Governs place CRUD. Members hold a read-only role.
    pub fn can_manage_content(&self, user: &UserPublic) -> bool {
        user.user_id == self.owner_id || self.collaborator_ids.contains(&user.user_id)
    }

    /// Governs the membership lists and trip edit/delete.
    pub fn can_manage_membership(&self, user: &UserPublic) -> bool {
        user.user_id == self.owner_id || user.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use crate::trip::Trip;
    use crate::user::{UserPublic, UserRole};

    fn user(user_id: i64, role: UserRole) -> UserPublic {
        UserPublic {
            user_id,
            name: format!("User {user_id}"),
            email: format!("user{user_id}@example.com"),
            role,
        }
    }

    fn trip() -> Trip {
        let mut trip = Trip::new(1, 1, "Norway".to_string(), String::new(), None, None);
        trip.collaborator_ids = vec![2];
        trip.member_ids = vec![3];
        trip
    }

    #[test]
    fn view_is_granted_to_all_three_roles() {
        let trip = trip();
        assert!(trip.can_view(&user(1, UserRole::Regular)));
        assert!(trip.can_view(&user(2, UserRole::Regular)));
        assert!(trip.can_view(&user(3, UserRole::Regular)));
        assert!(!trip.can_view(&user(4, UserRole::Regular)));
    }

    #[test]
    fn admin_can_view_unrelated_trip() {
        assert!(trip().can_view(&user(99, UserRole::Admin)));
    }

    #[test]
    fn members_cannot_manage_content() {
        let trip = trip();
        assert!(trip.can_manage_content(&user(1, UserRole::Regular)));
        assert!(trip.can_manage_content(&user(2, UserRole::Regular)));
        assert!(!trip.can_manage_content(&user(3, UserRole::Regular)));
        // Admin rights cover membership, not itinerary content.
        assert!(!trip.can_manage_content(&user(99, UserRole::Admin)));
    }

    #[test]
    fn membership_is_managed_by_owner_and_admin_only() {
        let trip = trip();
        assert!(trip.can_manage_membership(&user(1, UserRole::Regular)));
        assert!(!trip.can_manage_membership(&user(2, UserRole::Regular)));
        assert!(!trip.can_manage_membership(&user(3, UserRole::Regular)));
        assert!(trip.can_manage_membership(&user(99, UserRole::Admin)));
    }

    #[test]
    fn managing_content_implies_view_access() {
        let trip = trip();
        for id in 1..=5 {
            for role in [UserRole::Regular, UserRole::Admin] {
                let user = user(id, role);
                if trip.can_manage_content(&user) {
                    assert!(trip.can_view(&user));
                }
            }
        }
    }
}
