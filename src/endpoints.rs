//! The API endpoints URIs.
//!
//! Paths with a parameter, e.g., '/friends/{friend_id}', use axum's `{name}` capture syntax.

/// The route for checking that the server is up.
pub const HEALTH: &str = "/health";

/// The route to create and list friends.
pub const FRIENDS: &str = "/friends";
/// The route to delete a friend.
pub const FRIEND: &str = "/friends/{friend_id}";
/// The route to set a friend's saved amount.
pub const FRIEND_SAVED: &str = "/friends/{friend_id}/saved";
/// The route to overwrite a friend's balance.
pub const FRIEND_BALANCE: &str = "/friends/{friend_id}/balance";
/// The route to debit a friend's balance.
pub const FRIEND_DEDUCT: &str = "/friends/{friend_id}/deduct";
/// The route to credit a friend's balance.
pub const FRIEND_CREDIT: &str = "/friends/{friend_id}/credit";
/// The route to list a friend's ledger.
pub const FRIEND_TRANSACTIONS: &str = "/friends/{friend_id}/transactions";
/// The alternate route to debit a friend's balance.
pub const SEND: &str = "/send/{friend_id}";

/// The route to create a loan.
pub const LOANS: &str = "/loans";
/// The route to record a repayment.
pub const LOAN_REPAY: &str = "/loans/repay";
/// The route to amend or delete a loan entry.
pub const LOAN: &str = "/loans/{loan_id}";
/// The route to send a reminder about a loan entry.
pub const LOAN_NOTIFY: &str = "/loans/{loan_id}/notify";
/// The route to get a friend's loan ledger.
pub const FRIEND_LOANS: &str = "/loans/friend/{friend_id}";
/// The route to send a reminder about everything a friend owes.
pub const FRIEND_LOANS_NOTIFY: &str = "/loans/friend/{friend_id}/notify";
/// The route for the owed amounts of every friend.
pub const LOAN_OVERVIEW: &str = "/loans/overview";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/friends/{friend_id}', '{friend_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::HEALTH,
            endpoints::FRIENDS,
            endpoints::FRIEND,
            endpoints::FRIEND_SAVED,
            endpoints::FRIEND_BALANCE,
            endpoints::FRIEND_DEDUCT,
            endpoints::FRIEND_CREDIT,
            endpoints::FRIEND_TRANSACTIONS,
            endpoints::SEND,
            endpoints::LOANS,
            endpoints::LOAN_REPAY,
            endpoints::LOAN,
            endpoints::LOAN_NOTIFY,
            endpoints::FRIEND_LOANS,
            endpoints::FRIEND_LOANS_NOTIFY,
            endpoints::LOAN_OVERVIEW,
        ] {
            assert_endpoint_is_valid_uri(&format_endpoint(endpoint, 1));
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        assert_eq!(format_endpoint("/loans/overview", 1), "/loans/overview");
    }

    #[test]
    fn parameter_in_middle() {
        assert_eq!(
            format_endpoint(endpoints::FRIEND_DEDUCT, 42),
            "/friends/42/deduct"
        );
        assert_eq!(
            format_endpoint(endpoints::FRIEND_LOANS_NOTIFY, 7),
            "/loans/friend/7/notify"
        );
    }
}
