use thiserror::Error;
use validator::ValidationErrors;

/// Why a single order submission did not produce an order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),

    #[error("order request timed out")]
    Timeout,

    /// Non-2xx answer (or `success: false`) from the order API.
    #[error("{message}")]
    ServerRejection { status: u16, message: String },

    #[error("unexpected response from order API: {0}")]
    UnexpectedResponse(String),
}

impl SubmitError {
    /// Text shown to the shopper. Server messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::ServerRejection { message, .. } => message.clone(),
            SubmitError::Network(_) | SubmitError::Timeout => {
                "We couldn't reach the store. Check your connection and try again.".to_string()
            }
            SubmitError::UnexpectedResponse(_) => {
                "Something went wrong while placing your order. Please try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("shipping details are invalid: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("order already placed for this checkout")]
    AlreadyCompleted,
}
