use serde::{Deserialize, Serialize};

use crate::db::Id;
use crate::error::{AppError, AppResult};

/// Identity established by a credential check, before a token exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Id,
    pub username: String,
    pub is_admin: bool,
}

/// JWT payload carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Id,           // user ID
    pub username: String,
    pub is_admin: bool,
    pub iat: i64,          // issued at (unix timestamp)
    pub exp: i64,          // expires at (unix timestamp)
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            username: self.username.clone(),
            is_admin: self.is_admin,
        }
    }

    /// Owner predicate for repository mutations: admins act unscoped.
    pub fn owner_scope(&self) -> Option<Id> {
        if self.is_admin {
            None
        } else {
            Some(self.sub)
        }
    }

    pub fn can_act_for(&self, owner: Id) -> bool {
        self.is_admin || self.sub == owner
    }

    pub fn ensure_can_act_for(&self, owner: Id, what: &str) -> AppResult<()> {
        if self.can_act_for(owner) {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "{what} belongs to another user"
            )))
        }
    }

    /// Resolves the owner of a new resource: defaults to the caller, and only
    /// admins may create on behalf of someone else.
    pub fn resolve_owner(&self, requested: Option<Id>, what: &str) -> AppResult<Id> {
        let owner = requested.unwrap_or(self.sub);
        if !self.can_act_for(owner) {
            return Err(AppError::Unauthorized(format!(
                "must be admin to create {what} for other users"
            )));
        }
        Ok(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: Id, is_admin: bool) -> Claims {
        Claims {
            sub,
            username: format!("user{sub}"),
            is_admin,
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn admins_are_unscoped() {
        assert_eq!(claims(1, true).owner_scope(), None);
        assert_eq!(claims(1, false).owner_scope(), Some(1));
    }

    #[test]
    fn only_admins_act_for_others() {
        assert!(claims(1, false).can_act_for(1));
        assert!(!claims(1, false).can_act_for(2));
        assert!(claims(1, true).can_act_for(2));
        assert!(matches!(
            claims(1, false).resolve_owner(Some(2), "jobs"),
            Err(AppError::Unauthorized(_))
        ));
        assert_eq!(claims(5, false).resolve_owner(None, "jobs").unwrap(), 5);
    }
}
