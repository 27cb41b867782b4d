//! Group directory: group name → members, plus user → group.

use std::collections::{BTreeMap, HashMap};

use crate::GroupError;

/// All registered groups and who belongs to which.
///
/// Two maps are kept in sync:
///
/// ```text
/// groups:      "rust" → ["alice", "bob"]
/// memberships: "alice" → "rust", "bob" → "rust"
/// ```
///
/// A user with a membership entry appears exactly once in that group's
/// member list, and every listed member points back at the group. Joining a
/// second group moves the user out of the first.
#[derive(Debug, Default)]
pub struct GroupDirectory {
    groups: BTreeMap<String, Vec<String>>,
    memberships: HashMap<String, String>,
}

impl GroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `group` with `creator` as its first and only member.
    ///
    /// # Errors
    /// [`GroupError::AlreadyExists`] if the name is taken.
    pub fn create(&mut self, group: &str, creator: &str) -> Result<(), GroupError> {
        if self.groups.contains_key(group) {
            return Err(GroupError::AlreadyExists(group.to_owned()));
        }

        self.detach(creator);
        self.groups.insert(group.to_owned(), vec![creator.to_owned()]);
        self.memberships.insert(creator.to_owned(), group.to_owned());
        tracing::info!(%group, %creator, "group created");
        Ok(())
    }

    /// Appends `user` to `group`.
    ///
    /// # Errors
    /// - [`GroupError::NotFound`] if the group is not registered
    /// - [`GroupError::AlreadyMember`] if the user is already listed
    pub fn add(&mut self, group: &str, user: &str) -> Result<(), GroupError> {
        if !self.groups.contains_key(group) {
            return Err(GroupError::NotFound(group.to_owned()));
        }
        if self.is_member(group, user) {
            return Err(GroupError::AlreadyMember {
                user: user.to_owned(),
                group: group.to_owned(),
            });
        }

        self.detach(user);
        if let Some(members) = self.groups.get_mut(group) {
            members.push(user.to_owned());
        }
        self.memberships.insert(user.to_owned(), group.to_owned());
        tracing::info!(%group, %user, "user added to group");
        Ok(())
    }

    /// Checks that `user` may speak in `group` and returns its members.
    ///
    /// # Errors
    /// - [`GroupError::NotFound`] if the group is not registered
    /// - [`GroupError::NotMember`] if the user's membership names another
    ///   group or none
    pub fn members_for_sender(
        &self,
        group: &str,
        user: &str,
    ) -> Result<&[String], GroupError> {
        let members = self
            .groups
            .get(group)
            .ok_or_else(|| GroupError::NotFound(group.to_owned()))?;
        if self.group_of(user) != Some(group) {
            return Err(GroupError::NotMember {
                user: user.to_owned(),
                group: group.to_owned(),
            });
        }
        Ok(members)
    }

    /// The members of `group`, in the order they joined.
    pub fn members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// The group `user` currently belongs to.
    pub fn group_of(&self, user: &str) -> Option<&str> {
        self.memberships.get(user).map(String::as_str)
    }

    /// `true` if `user` is a member of `group`.
    pub fn is_member(&self, group: &str, user: &str) -> bool {
        self.group_of(user) == Some(group)
    }

    /// `true` if `group` is registered.
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Number of registered groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `true` if no group is registered.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drops every group and membership.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.memberships.clear();
    }

    /// Verifies the two maps agree.
    ///
    /// Returns a description of the first inconsistency found: a member
    /// listed twice, a listed member whose index entry is missing or points
    /// elsewhere, or an index entry naming a group that does not list the
    /// user.
    pub fn check_consistency(&self) -> Result<(), String> {
        for (group, members) in &self.groups {
            for (i, member) in members.iter().enumerate() {
                if members[..i].contains(member) {
                    return Err(format!("{member} listed twice in {group}"));
                }
                if self.group_of(member) != Some(group.as_str()) {
                    return Err(format!(
                        "{member} is listed in {group} but indexed to {:?}",
                        self.group_of(member)
                    ));
                }
            }
        }
        for (user, group) in &self.memberships {
            let listed = self
                .groups
                .get(group)
                .is_some_and(|members| members.contains(user));
            if !listed {
                return Err(format!("{user} is indexed to {group} but not listed"));
            }
        }
        Ok(())
    }

    /// Removes `user` from whatever group they are in.
    fn detach(&mut self, user: &str) {
        let Some(previous) = self.memberships.remove(user) else {
            return;
        };
        if let Some(members) = self.groups.get_mut(&previous) {
            members.retain(|member| member != user);
        }
        tracing::debug!(%user, group = %previous, "user moved out of group");
    }
}
