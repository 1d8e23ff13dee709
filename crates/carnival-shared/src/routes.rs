//! Post-checkout landing routes.
//!
//! The payment provider redirects back to one of two fixed paths; the front
//! end reads the location once at load time to decide which banner to show.

use crate::constants::{CHECKOUT_CANCEL_PATH, CHECKOUT_SUCCESS_PATH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutRoute {
    Success { session_id: Option<String> },
    Cancelled,
}

impl CheckoutRoute {
    /// Classify a `path?query` string. Returns `None` for any other route.
    pub fn from_location(location: &str) -> Option<Self> {
        let (path, query) = match location.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (location, None),
        };
        let path = path.trim_end_matches('/');

        if path == CHECKOUT_SUCCESS_PATH {
            let session_id = query.and_then(|q| {
                q.split('&')
                    .filter_map(|pair| pair.split_once('='))
                    .find(|(k, _)| *k == "session_id")
                    .map(|(_, v)| v.to_string())
                    .filter(|v| !v.is_empty())
            });
            Some(Self::Success { session_id })
        } else if path == CHECKOUT_CANCEL_PATH {
            Some(Self::Cancelled)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_with_session() {
        assert_eq!(
            CheckoutRoute::from_location("/checkout-success?session_id=cs_test_123"),
            Some(CheckoutRoute::Success {
                session_id: Some("cs_test_123".into())
            })
        );
    }

    #[test]
    fn success_without_session() {
        assert_eq!(
            CheckoutRoute::from_location("/checkout-success/"),
            Some(CheckoutRoute::Success { session_id: None })
        );
    }

    #[test]
    fn cancelled_and_unrelated() {
        assert_eq!(
            CheckoutRoute::from_location("/checkout-cancelled"),
            Some(CheckoutRoute::Cancelled)
        );
        assert_eq!(CheckoutRoute::from_location("/"), None);
        assert_eq!(CheckoutRoute::from_location("/about"), None);
    }
}
