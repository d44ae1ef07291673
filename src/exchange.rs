//! Exchange request rules
//!
//! Building an offer and moving a request between states are checked here
//! before anything is sent to the backend. The backend's own access rules
//! still apply on top.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Book, BookStatus, ExchangeRequest, ExchangeStatus, NewExchangeRequest};

/// Why an offer or a transition was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("a book cannot be exchanged for itself")]
    SameBook,
    #[error("you can only offer your own books")]
    OfferNotOwned,
    #[error("you cannot request your own book")]
    OwnBook,
    #[error("\"{title}\" is no longer available")]
    Unavailable { title: String },
    #[error("only the owner of the requested book can respond")]
    NotOwner,
    #[error("request is already {0}")]
    NotPending(ExchangeStatus),
    #[error("requests can only be accepted or rejected")]
    InvalidTarget(ExchangeStatus),
}

/// Build a pending request for `requested`, offering `offered` in return
pub fn build_offer(
    requester: Uuid,
    requested: &Book,
    offered: &Book,
    message: Option<String>,
) -> Result<NewExchangeRequest, ExchangeError> {
    if requested.id == offered.id {
        return Err(ExchangeError::SameBook);
    }
    if requested.owner_id == requester {
        return Err(ExchangeError::OwnBook);
    }
    if offered.owner_id != requester {
        return Err(ExchangeError::OfferNotOwned);
    }
    for book in [requested, offered] {
        if book.status != BookStatus::Available {
            return Err(ExchangeError::Unavailable {
                title: book.title.clone(),
            });
        }
    }

    Ok(NewExchangeRequest {
        requester_id: requester,
        owner_id: requested.owner_id,
        requested_book_id: requested.id,
        offered_book_id: offered.id,
        status: ExchangeStatus::Pending,
        message: message.filter(|m| !m.trim().is_empty()),
    })
}

/// Books the requester may offer: their own, available, and not the requested one
pub fn offerable<'a>(requester: Uuid, requested: &Book, mine: &'a [Book]) -> Vec<&'a Book> {
    mine.iter()
        .filter(|b| {
            b.owner_id == requester && b.status == BookStatus::Available && b.id != requested.id
        })
        .collect()
}

/// Check that `actor` may move `request` to `target`
pub fn check_transition(
    request: &ExchangeRequest,
    actor: Uuid,
    target: ExchangeStatus,
) -> Result<(), ExchangeError> {
    if !matches!(target, ExchangeStatus::Accepted | ExchangeStatus::Rejected) {
        return Err(ExchangeError::InvalidTarget(target));
    }
    if request.owner_id != actor {
        return Err(ExchangeError::NotOwner);
    }
    if request.status != ExchangeStatus::Pending {
        return Err(ExchangeError::NotPending(request.status));
    }
    Ok(())
}

/// Whether the viewer gets accept/reject controls for a request
pub fn can_respond(request: &ExchangeRequest, viewer: Uuid) -> bool {
    request.owner_id == viewer && request.status == ExchangeStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookCondition, NewBook};

    fn book(owner: Uuid, title: &str) -> Book {
        NewBook::new(owner, title, "Author", "Fiction", BookCondition::Good, None)
            .into_book(Uuid::new_v4())
    }

    #[test]
    fn test_build_offer() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let x = book(alice, "X");
        let y = book(bob, "Y");

        let offer = build_offer(bob, &x, &y, Some("  ".to_string())).unwrap();
        assert_eq!(offer.owner_id, alice);
        assert_eq!(offer.requester_id, bob);
        assert_eq!(offer.requested_book_id, x.id);
        assert_eq!(offer.offered_book_id, y.id);
        assert_eq!(offer.status, ExchangeStatus::Pending);
        assert!(offer.message.is_none());
    }

    #[test]
    fn test_same_book_is_refused() {
        let alice = Uuid::new_v4();
        let x = book(alice, "X");
        assert_eq!(
            build_offer(Uuid::new_v4(), &x, &x, None),
            Err(ExchangeError::SameBook)
        );
    }

    #[test]
    fn test_offer_must_be_owned_by_requester() {
        let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let x = book(alice, "X");
        let z = book(carol, "Z");
        assert_eq!(build_offer(bob, &x, &z, None), Err(ExchangeError::OfferNotOwned));
    }

    #[test]
    fn test_cannot_request_own_book() {
        let alice = Uuid::new_v4();
        let x = book(alice, "X");
        let w = book(alice, "W");
        assert_eq!(build_offer(alice, &x, &w, None), Err(ExchangeError::OwnBook));
    }

    #[test]
    fn test_unavailable_book_is_refused() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let x = book(alice, "X");
        let mut y = book(bob, "Y");
        y.status = BookStatus::Exchanged;
        assert_eq!(
            build_offer(bob, &x, &y, None),
            Err(ExchangeError::Unavailable {
                title: "Y".to_string()
            })
        );
    }

    #[test]
    fn test_offerable_lists_only_own_available_books() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let x = book(alice, "X");
        let mut pending = book(bob, "Pending");
        pending.status = BookStatus::Pending;
        let shelf = vec![book(bob, "Y"), pending, book(alice, "Stray"), x.clone()];

        let titles: Vec<&str> = offerable(bob, &x, &shelf)
            .iter()
            .map(|b| b.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Y"]);
    }

    #[test]
    fn test_transitions() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let x = book(alice, "X");
        let y = book(bob, "Y");
        let mut request = build_offer(bob, &x, &y, None)
            .unwrap()
            .into_request(Uuid::new_v4());

        assert_eq!(
            check_transition(&request, bob, ExchangeStatus::Accepted),
            Err(ExchangeError::NotOwner)
        );
        assert_eq!(
            check_transition(&request, alice, ExchangeStatus::Completed),
            Err(ExchangeError::InvalidTarget(ExchangeStatus::Completed))
        );
        assert!(check_transition(&request, alice, ExchangeStatus::Rejected).is_ok());
        assert!(can_respond(&request, alice));
        assert!(!can_respond(&request, bob));

        request.status = ExchangeStatus::Accepted;
        assert_eq!(
            check_transition(&request, alice, ExchangeStatus::Rejected),
            Err(ExchangeError::NotPending(ExchangeStatus::Accepted))
        );
        assert!(!can_respond(&request, alice));
    }
}
