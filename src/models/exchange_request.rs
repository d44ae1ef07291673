//! Exchange request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Book;

/// Status of an exchange request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    /// Waiting for the owner's decision
    #[default]
    Pending,
    /// Owner agreed to the swap
    Accepted,
    /// Owner declined the swap
    Rejected,
    /// Swap happened
    Completed,
}

impl ExchangeStatus {
    /// Value used in filters and storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    /// Get emoji for status
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Pending => "⏳",
            Self::Accepted => "✅",
            Self::Rejected => "❌",
            Self::Completed => "📚",
        }
    }
}

impl std::fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed swap between two books
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    /// Unique identifier
    pub id: Uuid,
    /// Profile proposing the swap
    pub requester_id: Uuid,
    /// Owner of the requested book
    pub owner_id: Uuid,
    /// Book the requester wants
    pub requested_book_id: Uuid,
    /// Book the requester gives in return
    pub offered_book_id: Uuid,
    /// Current status
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rating_requester: Option<i32>,
    #[serde(default)]
    pub rating_owner: Option<i32>,
    #[serde(default)]
    pub exchange_location: Option<String>,
    #[serde(default)]
    pub exchange_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub canceled_by: Option<Uuid>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

impl ExchangeRequest {
    /// Whether the profile takes part in this request
    pub fn involves(&self, profile_id: Uuid) -> bool {
        self.requester_id == profile_id || self.owner_id == profile_id
    }
}

/// Exchange request joined with both referenced books
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRequestDetails {
    #[serde(flatten)]
    pub request: ExchangeRequest,
    pub requested_book: Book,
    pub offered_book: Book,
}

/// Row inserted when a requester submits an offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewExchangeRequest {
    pub requester_id: Uuid,
    pub owner_id: Uuid,
    pub requested_book_id: Uuid,
    pub offered_book_id: Uuid,
    pub status: ExchangeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NewExchangeRequest {
    /// Materialise into a full row (used by the in-memory backend)
    pub fn into_request(self, id: Uuid) -> ExchangeRequest {
        let now = Utc::now();
        ExchangeRequest {
            id,
            requester_id: self.requester_id,
            owner_id: self.owner_id,
            requested_book_id: self.requested_book_id,
            offered_book_id: self.offered_book_id,
            status: self.status,
            created_at: now,
            updated_at: now,
            message: self.message,
            response_message: None,
            completed_at: None,
            rating_requester: None,
            rating_owner: None,
            exchange_location: None,
            exchange_date: None,
            canceled_by: None,
            cancel_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_deserialize_from_joined_row() {
        let owner = "11111111-1111-1111-1111-111111111111";
        let requester = "22222222-2222-2222-2222-222222222222";
        let book = |id: &str, owner: &str| {
            serde_json::json!({
                "id": id,
                "owner_id": owner,
                "title": "T",
                "author": "A",
                "genre": "Drama",
                "condition": "Good",
                "status": "available",
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z"
            })
        };
        let row = serde_json::json!({
            "id": "33333333-3333-3333-3333-333333333333",
            "requester_id": requester,
            "owner_id": owner,
            "requested_book_id": "44444444-4444-4444-4444-444444444444",
            "offered_book_id": "55555555-5555-5555-5555-555555555555",
            "status": "pending",
            "created_at": "2024-01-02T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "requested_book": book("44444444-4444-4444-4444-444444444444", owner),
            "offered_book": book("55555555-5555-5555-5555-555555555555", requester)
        });

        let details: ExchangeRequestDetails = serde_json::from_value(row).unwrap();
        assert_eq!(details.request.status, ExchangeStatus::Pending);
        assert_eq!(details.requested_book.id, details.request.requested_book_id);
        assert_eq!(details.offered_book.id, details.request.offered_book_id);
    }

    #[test]
    fn test_involves() {
        let new = NewExchangeRequest {
            requester_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            requested_book_id: Uuid::new_v4(),
            offered_book_id: Uuid::new_v4(),
            status: ExchangeStatus::Pending,
            message: None,
        };
        let requester = new.requester_id;
        let owner = new.owner_id;
        let request = new.into_request(Uuid::new_v4());
        assert!(request.involves(requester));
        assert!(request.involves(owner));
        assert!(!request.involves(Uuid::new_v4()));
    }
}
