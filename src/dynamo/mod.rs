//! Document-store wire format: query construction and response decoding.

pub mod codec;
pub mod query;

pub use codec::{decode_page, encode_expression, AttributeValue, Attributes, FromAttributes};
pub use query::{Operation, PendingRequestKey, QueryBuilder, QueryExpression};
