//! Access policy: who may see and change what.
//!
//! Every function here is a pure function of its arguments. The caller passes
//! the current subject explicitly (`None` is the guest) and, for
//! recipe-scoped checks, an already-loaded [`Recipe`]. Nothing here fetches,
//! navigates, or prints; a [`Decision::Deny`] carries the data a caller needs
//! to do those things itself.
//!
//! Role checks are exact set membership. `Admin` is not implicitly a `Chef`;
//! a rule that admits both lists both.

use std::fmt;

use serde::Serialize;

use crate::{
  recipe::Recipe,
  subject::{Role, Subject},
};

/// Roles allowed to create and import recipes.
pub const RECIPE_MANAGERS: &[Role] = &[Role::Chef, Role::Admin];

/// Roles allowed into the administration commands.
pub const ADMINISTRATORS: &[Role] = &[Role::Admin];

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// A logical destination for the caller's router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Route {
  #[serde(rename = "/login")]
  Login,
  /// The safe default page.
  #[serde(rename = "/")]
  Home,
}

impl Route {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Login => "/login",
      Self::Home => "/",
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Why an action was denied. The two reasons must never share wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
  /// There is no resolved subject.
  Unauthenticated,
  /// The subject lacks the required role or ownership.
  Forbidden,
}

impl DenyReason {
  pub fn code(self) -> &'static str {
    match self {
      Self::Unauthenticated => "unauthenticated",
      Self::Forbidden => "forbidden",
    }
  }

  /// One-line, user-facing message.
  pub fn message(self) -> &'static str {
    match self {
      Self::Unauthenticated => "Please log in to continue.",
      Self::Forbidden => "You don't have permission to do that.",
    }
  }

  pub fn redirect(self) -> Route {
    match self {
      Self::Unauthenticated => Route::Login,
      Self::Forbidden => Route::Home,
    }
  }
}

impl fmt::Display for DenyReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

/// The result of a policy evaluation. Denial is an ordinary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
  Allow,
  Deny { reason: DenyReason, redirect: Route },
}

impl Decision {
  pub fn deny(reason: DenyReason) -> Self {
    Self::Deny { reason, redirect: reason.redirect() }
  }

  pub fn is_allowed(&self) -> bool { matches!(self, Self::Allow) }
}

// ─── Checks ──────────────────────────────────────────────────────────────────

/// Any resolved subject passes, whatever its role.
pub fn can_access_protected(subject: Option<&Subject>) -> Decision {
  match subject {
    Some(_) => Decision::Allow,
    None => Decision::deny(DenyReason::Unauthenticated),
  }
}

/// The subject must be present and its role must be one of `allowed`.
pub fn can_access_role(subject: Option<&Subject>, allowed: &[Role]) -> Decision {
  match subject {
    None => Decision::deny(DenyReason::Unauthenticated),
    Some(s) if allowed.contains(&s.role) => Decision::Allow,
    Some(_) => Decision::deny(DenyReason::Forbidden),
  }
}

/// Creating recipes is reserved for chefs and admins.
pub fn can_manage_recipes(subject: Option<&Subject>) -> bool {
  can_access_role(subject, RECIPE_MANAGERS).is_allowed()
}

pub fn can_edit_recipe(subject: Option<&Subject>, recipe: &Recipe) -> bool {
  owner_or_admin(subject, recipe)
}

pub fn can_delete_recipe(subject: Option<&Subject>, recipe: &Recipe) -> bool {
  owner_or_admin(subject, recipe)
}

/// Admins may change anyone's role except their own.
pub fn can_assign_role(subject: Option<&Subject>, target: &Subject) -> bool {
  matches!(subject, Some(s) if s.role == Role::Admin && s.id != target.id)
}

/// Lift a boolean check into a [`Decision`].
pub fn authorize(subject: Option<&Subject>, allowed: bool) -> Decision {
  match (subject, allowed) {
    (None, _) => Decision::deny(DenyReason::Unauthenticated),
    (Some(_), true) => Decision::Allow,
    (Some(_), false) => Decision::deny(DenyReason::Forbidden),
  }
}

// Shared by edit and delete; the two must not diverge.
fn owner_or_admin(subject: Option<&Subject>, recipe: &Recipe) -> bool {
  match subject {
    None => false,
    Some(s) => match s.role {
      Role::Admin => true,
      Role::Chef => recipe.owner_id == s.id,
      Role::User => false,
    },
  }
}

// ─── Guards ──────────────────────────────────────────────────────────────────

/// What a route or command requires before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
  Public,
  Protected,
  Roles(&'static [Role]),
}

impl Guard {
  pub fn evaluate(&self, subject: Option<&Subject>) -> Decision {
    match self {
      Self::Public => Decision::Allow,
      Self::Protected => can_access_protected(subject),
      Self::Roles(allowed) => can_access_role(subject, allowed),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::{
    recipe::{Recipe, RecipeId},
    subject::UserId,
  };

  fn id(n: u128) -> UserId { UserId(Uuid::from_u128(n)) }

  fn subject(n: u128, role: Role) -> Subject {
    Subject {
      id: id(n),
      username: format!("u{n}"),
      role,
      created_at: Utc::now(),
    }
  }

  fn recipe_owned_by(owner: u128) -> Recipe {
    let at = Utc::now();
    Recipe {
      id:           RecipeId::new(),
      owner_id:     id(owner),
      title:        "Pancakes".into(),
      category:     None,
      ingredients:  vec![],
      instructions: String::new(),
      image_url:    None,
      source_ref:   None,
      created_at:   at,
      updated_at:   at,
    }
  }

  const ALL_ROLES: [Role; 3] = [Role::User, Role::Chef, Role::Admin];

  // ── Ownership rules ───────────────────────────────────────────────────

  #[test]
  fn admin_edits_and_deletes_anything() {
    let admin = subject(9, Role::Admin);
    for owner in [1, 2, 9] {
      let r = recipe_owned_by(owner);
      assert!(can_edit_recipe(Some(&admin), &r));
      assert!(can_delete_recipe(Some(&admin), &r));
    }
  }

  #[test]
  fn chef_edits_only_own_recipes() {
    let chef = subject(1, Role::Chef);
    assert!(can_edit_recipe(Some(&chef), &recipe_owned_by(1)));
    assert!(can_delete_recipe(Some(&chef), &recipe_owned_by(1)));
    assert!(!can_edit_recipe(Some(&chef), &recipe_owned_by(2)));
    assert!(!can_delete_recipe(Some(&chef), &recipe_owned_by(2)));
  }

  #[test]
  fn plain_user_cannot_manage_even_own_recipe() {
    let user = subject(1, Role::User);
    assert!(!can_manage_recipes(Some(&user)));
    // e.g. authored while still a chef, then demoted
    let own = recipe_owned_by(1);
    assert!(!can_edit_recipe(Some(&user), &own));
    assert!(!can_delete_recipe(Some(&user), &own));
  }

  #[test]
  fn edit_and_delete_always_agree() {
    for role in ALL_ROLES {
      let s = subject(1, role);
      for owner in [1, 2] {
        let r = recipe_owned_by(owner);
        assert_eq!(can_edit_recipe(Some(&s), &r), can_delete_recipe(Some(&s), &r));
      }
    }
    let r = recipe_owned_by(1);
    assert_eq!(can_edit_recipe(None, &r), can_delete_recipe(None, &r));
  }

  #[test]
  fn managers_are_chefs_and_admins() {
    assert!(can_manage_recipes(Some(&subject(1, Role::Chef))));
    assert!(can_manage_recipes(Some(&subject(1, Role::Admin))));
    assert!(!can_manage_recipes(Some(&subject(1, Role::User))));
  }

  // ── Guest ─────────────────────────────────────────────────────────────

  #[test]
  fn guest_is_denied_everything() {
    let r = recipe_owned_by(1);
    assert!(!can_manage_recipes(None));
    assert!(!can_edit_recipe(None, &r));
    assert!(!can_delete_recipe(None, &r));
    assert!(!can_assign_role(None, &subject(1, Role::User)));

    let unauth = Decision::Deny {
      reason:   DenyReason::Unauthenticated,
      redirect: Route::Login,
    };
    assert_eq!(can_access_protected(None), unauth);
    assert_eq!(can_access_role(None, &[Role::Admin]), unauth);
    assert_eq!(can_access_role(None, RECIPE_MANAGERS), unauth);
    assert_eq!(authorize(None, true), unauth);
    assert_eq!(Guard::Protected.evaluate(None), unauth);
    assert_eq!(Guard::Public.evaluate(None), Decision::Allow);
  }

  // ── Role gates ────────────────────────────────────────────────────────

  #[test]
  fn protected_admits_every_role() {
    for role in ALL_ROLES {
      assert_eq!(can_access_protected(Some(&subject(1, role))), Decision::Allow);
    }
  }

  #[test]
  fn user_is_forbidden_from_admin_area() {
    let user = subject(1, Role::User);
    assert_eq!(
      can_access_role(Some(&user), &[Role::Admin]),
      Decision::Deny { reason: DenyReason::Forbidden, redirect: Route::Home }
    );
  }

  #[test]
  fn role_membership_is_exact() {
    let admin = subject(1, Role::Admin);
    assert_eq!(
      can_access_role(Some(&admin), &[Role::Chef]),
      Decision::deny(DenyReason::Forbidden)
    );
    assert_eq!(can_access_role(Some(&admin), &[Role::Chef, Role::Admin]), Decision::Allow);
    assert_eq!(
      can_access_role(Some(&admin), &[]),
      Decision::deny(DenyReason::Forbidden)
    );
  }

  #[test]
  fn role_assignment_is_admin_only_and_never_self() {
    let admin = subject(1, Role::Admin);
    let chef = subject(2, Role::Chef);
    assert!(can_assign_role(Some(&admin), &chef));
    assert!(!can_assign_role(Some(&admin), &admin));
    assert!(!can_assign_role(Some(&chef), &subject(3, Role::User)));
  }

  #[test]
  fn authorize_distinguishes_reasons() {
    let chef = subject(1, Role::Chef);
    let theirs = recipe_owned_by(2);
    assert_eq!(
      authorize(Some(&chef), can_edit_recipe(Some(&chef), &theirs)),
      Decision::deny(DenyReason::Forbidden)
    );
    assert_eq!(authorize(Some(&chef), true), Decision::Allow);
  }

  // ── Outcome data ──────────────────────────────────────────────────────

  #[test]
  fn deny_reasons_map_to_distinct_routes_and_messages() {
    let u = DenyReason::Unauthenticated;
    let f = DenyReason::Forbidden;
    assert_eq!(u.redirect().as_str(), "/login");
    assert_eq!(f.redirect().as_str(), "/");
    assert_ne!(u.message(), f.message());
    assert_eq!(u.code(), "unauthenticated");
    assert_eq!(f.code(), "forbidden");
  }

  #[test]
  fn decision_serialises_with_reason_and_route() {
    let json = serde_json::to_value(Decision::deny(DenyReason::Forbidden)).unwrap();
    assert_eq!(json["decision"], "deny");
    assert_eq!(json["reason"], "forbidden");
    assert_eq!(json["redirect"], "/");
  }

  #[test]
  fn evaluation_is_repeatable() {
    let chef = subject(1, Role::Chef);
    let r = recipe_owned_by(2);
    let guard = Guard::Roles(RECIPE_MANAGERS);
    assert_eq!(guard.evaluate(Some(&chef)), guard.evaluate(Some(&chef)));
    assert_eq!(can_edit_recipe(Some(&chef), &r), can_edit_recipe(Some(&chef), &r));
  }

  // ── Worked scenarios ──────────────────────────────────────────────────

  #[test]
  fn scenario_chef_u1() {
    let chef = subject(1, Role::Chef);
    assert!(can_edit_recipe(Some(&chef), &recipe_owned_by(1)));
    assert!(!can_edit_recipe(Some(&chef), &recipe_owned_by(2)));
  }

  #[test]
  fn scenario_admin_u9() {
    let admin = subject(9, Role::Admin);
    assert!(can_edit_recipe(Some(&admin), &recipe_owned_by(2)));
  }
}
