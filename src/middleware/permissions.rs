//! Route level capability checks.
//!
//! Each route lists the `(role, account status)` combinations it accepts and
//! checks the resolved [`Actor`] against them before calling an engine.

use crate::error::{Error, Result};
use crate::models::user::{AccountStatus, Actor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Role(Role, AccountStatus),
    /// Any role, as long as the account is in the given status.
    AnyRole(AccountStatus),
}

impl Capability {
    pub fn allows(&self, actor: &Actor) -> bool {
        match *self {
            Capability::Role(role, status) => actor.role == role && actor.status == status,
            Capability::AnyRole(status) => actor.status == status,
        }
    }
}

pub fn is_authorized(actor: &Actor, required: &[Capability]) -> bool {
    required.iter().any(|cap| cap.allows(actor))
}

pub fn require(actor: &Actor, required: &[Capability]) -> Result<()> {
    if is_authorized(actor, required) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %actor.user_id,
        role = %actor.role,
        "actor lacks a capability for this route"
    );
    Err(Error::Forbidden(
        "You do not have access to this resource".to_string(),
    ))
}

const fn approved(role: Role) -> Capability {
    Capability::Role(role, AccountStatus::Approved)
}

pub const ANY_APPROVED: &[Capability] = &[Capability::AnyRole(AccountStatus::Approved)];
pub const STUDENT: &[Capability] = &[approved(Role::Student)];
pub const COMPANY: &[Capability] = &[approved(Role::CompanyAdmin), approved(Role::CompanyRecruiter)];
pub const COMPANY_ADMIN: &[Capability] = &[approved(Role::CompanyAdmin)];
pub const UNIVERSITY: &[Capability] = &[approved(Role::UniAdmin), approved(Role::UniCounselor)];
pub const STUDENT_OR_COMPANY: &[Capability] = &[
    approved(Role::Student),
    approved(Role::CompanyAdmin),
    approved(Role::CompanyRecruiter),
];
pub const COMPANY_OR_UNIVERSITY: &[Capability] = &[
    approved(Role::CompanyAdmin),
    approved(Role::CompanyRecruiter),
    approved(Role::UniAdmin),
    approved(Role::UniCounselor),
];
pub const EVENT_HOSTS: &[Capability] = &[
    approved(Role::Student),
    approved(Role::CompanyAdmin),
    approved(Role::CompanyRecruiter),
    approved(Role::UniAdmin),
    approved(Role::UniCounselor),
];
pub const ADMIN: &[Capability] = &[approved(Role::Owner), approved(Role::Admin)];

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn role_and_status_must_both_match() {
        let mut actor = Actor::company(Uuid::new_v4(), Role::CompanyRecruiter, Uuid::new_v4());
        assert!(is_authorized(&actor, COMPANY));
        assert!(!is_authorized(&actor, COMPANY_ADMIN));
        assert!(!is_authorized(&actor, STUDENT));

        actor.status = AccountStatus::Pending;
        assert!(!is_authorized(&actor, COMPANY));
        assert_eq!(require(&actor, COMPANY).unwrap_err().kind(), "forbidden");
    }

    #[test]
    fn any_role_only_checks_status() {
        let mut actor = Actor::student(Uuid::new_v4(), None);
        assert!(is_authorized(&actor, ANY_APPROVED));
        actor.status = AccountStatus::Blocked;
        assert!(!is_authorized(&actor, ANY_APPROVED));
        assert!(!is_authorized(&actor, &[]));
    }
}
