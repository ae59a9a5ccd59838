//! Order submission: turns a cart snapshot and the shipping form into a
//! single write against the order API.

mod client;
mod error;
mod flow;

pub use client::{HttpOrderApi, IDEMPOTENCY_KEY_HEADER, MockOrderApi, OrderApi, OrderConfirmation};
pub use error::{CheckoutError, SubmitError};
pub use flow::{CheckoutFlow, CheckoutState};
