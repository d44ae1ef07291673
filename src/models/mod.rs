//! Data models for BookSwap

mod book;
mod exchange_request;
mod profile;

pub use book::{BOOK_GENRES, Book, BookCondition, BookStatus, BookUpdate, NewBook};
pub use exchange_request::{
    ExchangeRequest, ExchangeRequestDetails, ExchangeStatus, NewExchangeRequest,
};
pub use profile::{NewProfile, Profile, ProfileUpdate, UserRole};
