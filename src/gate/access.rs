//! Access Rules
//!
//! Every mutating command names one `AccessRule`. The rule is a pure
//! predicate over `AccessFacts`; gathering the facts is the gate's job.

use crate::domain::ClanRole;

/// Authorization requirement of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// Any authenticated caller
    Authenticated,

    /// Callers holding the Administrator role
    Administrator,

    /// The chief of `clan_id`, or an Administrator
    ChiefOrAdministrator { clan_id: i64 },

    /// The player `player_id` themself, or an Administrator
    SelfOrAdministrator { player_id: i64 },

    /// The player `player_id` themself, the chief of `clan_id`, or an Administrator
    SelfChiefOrAdministrator { clan_id: i64, player_id: i64 },
}

/// What is known about the caller when a rule is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFacts {
    /// Player bound to the caller
    pub caller_player_id: Option<i64>,

    /// Caller's role in the clan the rule refers to (None: not a member)
    pub caller_clan_role: Option<ClanRole>,

    pub is_administrator: bool,
}

impl AccessRule {
    /// Clan whose membership row the rule needs
    pub fn clan_scope(&self) -> Option<i64> {
        match *self {
            AccessRule::ChiefOrAdministrator { clan_id }
            | AccessRule::SelfChiefOrAdministrator { clan_id, .. } => Some(clan_id),
            _ => None,
        }
    }

    pub fn permits(&self, facts: &AccessFacts) -> bool {
        if facts.is_administrator {
            return true;
        }

        let is_self = |player_id: i64| facts.caller_player_id == Some(player_id);
        let is_chief = facts.caller_clan_role == Some(ClanRole::Chief);

        match *self {
            AccessRule::Authenticated => true,
            AccessRule::Administrator => false,
            AccessRule::ChiefOrAdministrator { .. } => is_chief,
            AccessRule::SelfOrAdministrator { player_id } => is_self(player_id),
            AccessRule::SelfChiefOrAdministrator { player_id, .. } => {
                is_self(player_id) || is_chief
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(player: Option<i64>, role: Option<ClanRole>, admin: bool) -> AccessFacts {
        AccessFacts {
            caller_player_id: player,
            caller_clan_role: role,
            is_administrator: admin,
        }
    }

    #[test]
    fn test_administrator_passes_every_rule() {
        let admin = facts(None, None, true);
        for rule in [
            AccessRule::Authenticated,
            AccessRule::Administrator,
            AccessRule::ChiefOrAdministrator { clan_id: 1 },
            AccessRule::SelfOrAdministrator { player_id: 2 },
            AccessRule::SelfChiefOrAdministrator { clan_id: 1, player_id: 2 },
        ] {
            assert!(rule.permits(&admin), "{:?}", rule);
        }
    }

    #[test]
    fn test_chief_or_administrator() {
        let rule = AccessRule::ChiefOrAdministrator { clan_id: 1 };
        assert!(rule.permits(&facts(Some(5), Some(ClanRole::Chief), false)));
        assert!(!rule.permits(&facts(Some(5), Some(ClanRole::CoChief), false)));
        assert!(!rule.permits(&facts(Some(5), None, false)));
    }

    #[test]
    fn test_self_or_administrator() {
        let rule = AccessRule::SelfOrAdministrator { player_id: 5 };
        assert!(rule.permits(&facts(Some(5), None, false)));
        assert!(!rule.permits(&facts(Some(6), None, false)));
        assert!(!rule.permits(&facts(None, None, false)));
        // A chief role does not matter outside clan rules
        assert!(!rule.permits(&facts(Some(6), Some(ClanRole::Chief), false)));
    }

    #[test]
    fn test_self_chief_or_administrator() {
        let rule = AccessRule::SelfChiefOrAdministrator { clan_id: 1, player_id: 5 };
        assert!(rule.permits(&facts(Some(5), Some(ClanRole::Member), false)));
        assert!(rule.permits(&facts(Some(9), Some(ClanRole::Chief), false)));
        assert!(!rule.permits(&facts(Some(9), Some(ClanRole::Elder), false)));
    }

    #[test]
    fn test_administrator_rule_denies_everyone_else() {
        let rule = AccessRule::Administrator;
        assert!(!rule.permits(&facts(Some(1), Some(ClanRole::Chief), false)));
        assert!(AccessRule::Authenticated.permits(&AccessFacts::default()));
    }

    #[test]
    fn test_clan_scope() {
        assert_eq!(AccessRule::ChiefOrAdministrator { clan_id: 4 }.clan_scope(), Some(4));
        assert_eq!(AccessRule::SelfOrAdministrator { player_id: 4 }.clan_scope(), None);
    }
}
