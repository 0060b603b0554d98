use serde::{Deserialize, Serialize};

use crate::error::TripError;
use crate::trip::Trip;
use crate::user::UserPublic;

/// The two non-owner roles a user can hold on a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipList {
    Collaborator,
    Member,
}

impl Trip {
    /// Puts `target_user_id` on the requested list. Reassigning a role is a
    /// move: the id is dropped from the other list in the same call, so the
    /// lists stay disjoint. The owner cannot be demoted into a sub-list.
    pub fn add_to_list(&mut self, actor: &UserPublic, target_user_id: i64, list: MembershipList) -> Result<(), TripError> {
        if !self.can_manage_membership(actor) {
            return Err(TripError::Unauthorized);
        }
        if target_user_id == self.owner_id {
            return Err(TripError::InvalidTarget);
        }

        match list {
            MembershipList::Collaborator => {
                if self.collaborator_ids.contains(&target_user_id) {
                    return Err(TripError::AlreadyPresent);
                }
                self.member_ids.retain(|id| *id != target_user_id);
                self.collaborator_ids.push(target_user_id);
            }
            MembershipList::Member => {
                if self.member_ids.contains(&target_user_id) {
                    return Err(TripError::AlreadyPresent);
                }
                self.collaborator_ids.retain(|id| *id != target_user_id);
                self.member_ids.push(target_user_id);
            }
        }

        Ok(())
    }

    /// Removes `target_user_id` from both lists, whichever it is on. Callers
    /// never need to know which role the user held.
    pub fn remove_from_list(&mut self, actor: &UserPublic, target_user_id: i64) -> Result<(), TripError> {
        if !self.can_manage_membership(actor) {
            return Err(TripError::Unauthorized);
        }

        let before = self.collaborator_ids.len() + self.member_ids.len();
        self.collaborator_ids.retain(|id| *id != target_user_id);
        self.member_ids.retain(|id| *id != target_user_id);

        if self.collaborator_ids.len() + self.member_ids.len() == before {
            return Err(TripError::UserNotFound);
        }

        Ok(())
    }
}
