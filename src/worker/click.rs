use super::push::NotificationData;

/// Action id of the dismiss button
pub const CLOSE_ACTION: &str = "close";

/// Where a clicked notification should take the user: the fixed page
/// for its kind, else its own url, else the site root.
pub fn resolve_target(data: &NotificationData) -> String {
    if let Some(route) = data.kind.route() {
        return route.to_string();
    }
    data.url.clone().unwrap_or_else(|| "/".to_string())
}

/// Whether a window client belongs to the worker's origin.
pub fn same_origin(client_url: &str, origin: &str) -> bool {
    let origin = origin.trim_end_matches('/');
    client_url == origin
        || client_url
            .strip_prefix(origin)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('#'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The dismiss action was clicked, nothing else happens
    Dismissed,
    /// An open page was focused and navigated
    Focused { client_id: String, url: String },
    Opened { url: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;

    fn data(kind: NotificationKind, url: Option<&str>) -> NotificationData {
        NotificationData {
            kind,
            url: url.map(|u| u.to_string()),
            date_of_arrival: 0,
        }
    }

    #[test]
    fn it_routes_known_kinds_to_fixed_pages() {
        let cases = [
            (NotificationKind::Service, "/services"),
            (NotificationKind::Portfolio, "/portfolio"),
            (NotificationKind::Contact, "/contact"),
            (NotificationKind::Pricing, "/pricing"),
        ];
        for (kind, path) in cases {
            // The kind wins over an explicit url
            assert_eq!(resolve_target(&data(kind, Some("https://x.test"))), path);
        }
    }

    #[test]
    fn it_falls_back_to_url_then_root() {
        assert_eq!(
            resolve_target(&data(NotificationKind::General, Some("/blog/post"))),
            "/blog/post"
        );
        assert_eq!(resolve_target(&data(NotificationKind::General, None)), "/");
    }

    #[test]
    fn it_matches_same_origin_clients() {
        let origin = "https://kiatechsoftware.com";
        assert!(same_origin("https://kiatechsoftware.com/", origin));
        assert!(same_origin("https://kiatechsoftware.com/pricing", origin));
        assert!(same_origin("https://kiatechsoftware.com", origin));
        assert!(!same_origin("https://kiatechsoftware.com.evil.test/", origin));
        assert!(!same_origin("https://other.test/", origin));
    }
}
