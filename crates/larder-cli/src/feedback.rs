//! Turning policy denials into the one-line messages a user sees.

use larder_core::policy::{DenyReason, Route};

/// The command that stands in for a route on the command line.
pub fn route_hint(route: Route) -> &'static str {
  match route {
    Route::Login => "larder login",
    Route::Home => "larder recipes list",
  }
}

/// `"<message> (<route>: try `<command>`)"`
pub fn denial_line(reason: DenyReason, redirect: Route) -> String {
  format!("{} ({redirect}: try `{}`)", reason.message(), route_hint(redirect))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unauthenticated_points_at_login() {
    let line = denial_line(DenyReason::Unauthenticated, Route::Login);
    assert_eq!(line, "Please log in to continue. (/login: try `larder login`)");
  }

  #[test]
  fn forbidden_never_asks_to_log_in() {
    let line = denial_line(DenyReason::Forbidden, Route::Home);
    assert!(line.starts_with("You don't have permission"));
    assert!(!line.contains("log in"));
    assert!(line.contains("larder recipes list"));
  }
}
