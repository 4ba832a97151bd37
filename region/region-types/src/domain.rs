//! Owners, members and the actors tested against them.
//!
//! A [`Domain`] lists players (by UUID) and permission groups (by name).
//! An [`ActorContext`] describes who is asking: an optional player id and
//! the groups that player belongs to. An [`Association`] is the outcome of
//! testing an actor against a region's owners and members.

use hashbrown::HashSet;
use uuid::Uuid;

/// A set of players and permission groups.
///
/// Group names are compared case-insensitively (stored lower-cased).
///
/// # Example
///
/// ```
/// use region_types::{ActorContext, Domain};
/// use uuid::Uuid;
///
/// let alice = Uuid::from_u128(1);
/// let owners = Domain::new().with_player(alice).with_group("Builders");
///
/// assert!(owners.contains(&ActorContext::player(alice)));
/// assert!(owners.contains(&ActorContext::player(Uuid::from_u128(2)).with_group("builders")));
/// assert!(!owners.contains(&ActorContext::anonymous()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain {
    players: HashSet<Uuid>,
    groups: HashSet<String>,
}

impl Domain {
    /// Creates an empty domain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player.
    #[must_use]
    pub fn with_player(mut self, player: Uuid) -> Self {
        self.add_player(player);
        self
    }

    /// Adds a group.
    #[must_use]
    pub fn with_group(mut self, group: impl AsRef<str>) -> Self {
        self.add_group(group);
        self
    }

    /// Adds a player. Returns `false` if already present.
    pub fn add_player(&mut self, player: Uuid) -> bool {
        self.players.insert(player)
    }

    /// Removes a player. Returns `false` if absent.
    pub fn remove_player(&mut self, player: &Uuid) -> bool {
        self.players.remove(player)
    }

    /// Adds a group. Returns `false` if already present.
    pub fn add_group(&mut self, group: impl AsRef<str>) -> bool {
        self.groups.insert(group.as_ref().to_lowercase())
    }

    /// Removes a group. Returns `false` if absent.
    pub fn remove_group(&mut self, group: impl AsRef<str>) -> bool {
        self.groups.remove(&group.as_ref().to_lowercase())
    }

    /// Returns `true` if the player is listed directly.
    #[must_use]
    pub fn contains_player(&self, player: &Uuid) -> bool {
        self.players.contains(player)
    }

    /// Returns `true` if the group is listed.
    #[must_use]
    pub fn contains_group(&self, group: &str) -> bool {
        self.groups.contains(&group.to_lowercase())
    }

    /// Returns `true` if the actor's player id or any of its groups is
    /// listed.
    #[must_use]
    pub fn contains(&self, actor: &ActorContext) -> bool {
        actor.player.is_some_and(|p| self.players.contains(&p))
            || actor.groups.iter().any(|g| self.groups.contains(g))
    }

    /// Iterates over the listed players.
    pub fn players(&self) -> impl Iterator<Item = &Uuid> {
        self.players.iter()
    }

    /// Iterates over the listed groups.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Number of players plus number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len() + self.groups.len()
    }

    /// Returns `true` if neither players nor groups are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.groups.is_empty()
    }

    /// Removes every player and group.
    pub fn clear(&mut self) {
        self.players.clear();
        self.groups.clear();
    }
}

/// Who is asking.
///
/// Anonymous actors (no player id, no groups) are never owners or members
/// of anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorContext {
    player: Option<Uuid>,
    groups: Vec<String>,
}

impl ActorContext {
    /// An actor with no identity, such as a dispenser or an unknown entity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An identified player with no groups.
    #[must_use]
    pub fn player(player: Uuid) -> Self {
        Self {
            player: Some(player),
            groups: Vec::new(),
        }
    }

    /// Adds a permission group.
    #[must_use]
    pub fn with_group(mut self, group: impl AsRef<str>) -> Self {
        let group = group.as_ref().to_lowercase();
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
        self
    }

    /// Returns the player id, if identified.
    #[must_use]
    pub const fn player_id(&self) -> Option<Uuid> {
        self.player
    }

    /// Returns the actor's groups (lower-cased).
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns `true` if the actor has neither a player id nor groups.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.player.is_none() && self.groups.is_empty()
    }
}

/// How an actor relates to a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Association {
    /// Listed as an owner of the region or an ancestor.
    Owner,
    /// Listed as a member of the region or an ancestor.
    Member,
    /// Neither.
    NonMember,
}

impl Association {
    /// Returns `true` for owners and members.
    #[must_use]
    pub const fn is_member(self) -> bool {
        matches!(self, Self::Owner | Self::Member)
    }
}
