use uuid::Uuid;
use validator::Validate;

use crate::{
    cart::{CartStorage, CartStore, SaveOutcome},
    dto::orders::{OrderRequest, ShippingAddress},
    models::PaymentMethod,
};

use super::{
    client::{OrderApi, OrderConfirmation},
    error::{CheckoutError, SubmitError},
};

impl OrderRequest {
    /// Snapshot `cart` into an order request after checking the checkout
    /// preconditions.
    pub fn from_cart<S: CartStorage>(
        cart: &CartStore<S>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        shipping_address.validate()?;

        Ok(Self {
            items: cart.snapshot(),
            total: cart.total_price(),
            shipping_address,
            payment_method,
        })
    }
}

/// UI-visible state of a checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    Idle,
    Submitting,
    Success {
        order_number: String,
    },
    Error {
        error: SubmitError,
        message: String,
    },
}

/// The last attempted submission, kept so a retry of the same request reuses its key.
#[derive(Debug, Clone)]
struct Attempt {
    key: Uuid,
    request: OrderRequest,
}

/// Drives `Idle → Submitting → {Success, Error}`, with `Error → Submitting`
/// on a manual retry. `Success` is terminal.
#[derive(Debug)]
pub struct CheckoutFlow<A> {
    api: A,
    state: CheckoutState,
    attempt: Option<Attempt>,
}

impl<A: OrderApi> CheckoutFlow<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: CheckoutState::Idle,
            attempt: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn order_number(&self) -> Option<&str> {
        match &self.state {
            CheckoutState::Success { order_number } => Some(order_number),
            _ => None,
        }
    }

    /// Place the order for the current cart contents.
    ///
    /// Precondition failures leave the state untouched. A submission failure
    /// keeps the cart and moves to [`CheckoutState::Error`]; calling `submit`
    /// again is the retry. On success the cart is cleared.
    pub async fn submit<S: CartStorage>(
        &mut self,
        cart: &mut CartStore<S>,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<OrderConfirmation, CheckoutError> {
        if matches!(self.state, CheckoutState::Success { .. }) {
            return Err(CheckoutError::AlreadyCompleted);
        }

        let request = OrderRequest::from_cart(cart, shipping_address, payment_method)?;
        let key = self.attempt_key(&request);

        // A `Submitting` state found here means the previous attempt's future
        // was dropped before it resolved; it is retried with the same key.
        self.state = CheckoutState::Submitting;
        tracing::info!(
            lines = request.items.len(),
            total = %request.total,
            payment_method = %request.payment_method,
            "submitting order"
        );

        match self.api.submit_order(&request, key).await {
            Ok(confirmation) => {
                tracing::info!(order_number = %confirmation.order_number, "order placed");
                if cart.clear() == SaveOutcome::ResetToEmpty {
                    tracing::warn!("cart storage failed while clearing after checkout");
                }
                self.attempt = None;
                self.state = CheckoutState::Success {
                    order_number: confirmation.order_number.clone(),
                };
                Ok(confirmation)
            }
            Err(error) => {
                tracing::warn!(error = %error, "order submission failed");
                self.state = CheckoutState::Error {
                    message: error.user_message(),
                    error: error.clone(),
                };
                Err(error.into())
            }
        }
    }

    /// Reuse the previous key while the whole request (lines, total, address
    /// and payment method) is unchanged, so the server can recognise a retry
    /// of an order it already stored.
    fn attempt_key(&mut self, request: &OrderRequest) -> Uuid {
        match &self.attempt {
            Some(attempt) if attempt.request == *request => attempt.key,
            _ => {
                let key = Uuid::new_v4();
                self.attempt = Some(Attempt {
                    key,
                    request: request.clone(),
                });
                key
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        num::NonZeroU32,
        sync::{Arc, Mutex},
    };

    use mockall::Sequence;
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        cart::{CartItem, MemoryStorage},
        checkout::client::MockOrderApi,
        dto::orders::fixtures::shipping_address,
        models::{OrderStatus, PaymentStatus},
    };

    fn cart_with_total_300() -> CartStore<MemoryStorage> {
        let mut cart = CartStore::open(MemoryStorage::new());
        let item = CartItem::new("A", "Rose Water", Decimal::from(100)).with_size("250ml");
        cart.add_item(item.clone(), NonZeroU32::new(1).unwrap());
        cart.add_item(item, NonZeroU32::new(2).unwrap());
        cart
    }

    fn confirmation(number: &str) -> OrderConfirmation {
        OrderConfirmation {
            order_number: number.into(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
        }
    }

    #[tokio::test]
    async fn success_clears_cart_and_exposes_order_number() -> anyhow::Result<()> {
        let mut api = MockOrderApi::new();
        api.expect_submit_order()
            .once()
            .withf(|request, _| {
                request.total == Decimal::from(300)
                    && request.items.len() == 1
                    && request.items[0].quantity == 3
            })
            .return_once(|_, _| Ok(confirmation("CL000123")));

        let mut cart = cart_with_total_300();
        let mut flow = CheckoutFlow::new(api);

        let placed = flow
            .submit(&mut cart, shipping_address(), PaymentMethod::CashOnDelivery)
            .await?;

        assert_eq!(placed.order_number, "CL000123");
        assert!(cart.is_empty());
        assert_eq!(flow.order_number(), Some("CL000123"));
        Ok(())
    }

    #[tokio::test]
    async fn network_failure_keeps_cart_and_allows_retry() -> anyhow::Result<()> {
        let keys = Arc::new(Mutex::new(Vec::new()));
        let mut seq = Sequence::new();
        let mut api = MockOrderApi::new();

        let seen = Arc::clone(&keys);
        api.expect_submit_order()
            .once()
            .in_sequence(&mut seq)
            .returning(move |_, key| {
                seen.lock().unwrap().push(key);
                Err(SubmitError::Network("connection refused".into()))
            });
        let seen = Arc::clone(&keys);
        api.expect_submit_order()
            .once()
            .in_sequence(&mut seq)
            .returning(move |_, key| {
                seen.lock().unwrap().push(key);
                Ok(confirmation("CL000124"))
            });

        let mut cart = cart_with_total_300();
        let before = cart.snapshot();
        let mut flow = CheckoutFlow::new(api);

        let first = flow
            .submit(&mut cart, shipping_address(), PaymentMethod::CashOnDelivery)
            .await;

        assert!(matches!(
            first,
            Err(CheckoutError::Submit(SubmitError::Network(_)))
        ));
        assert_eq!(cart.lines(), before.as_slice());
        assert!(matches!(flow.state(), CheckoutState::Error { .. }));

        flow.submit(&mut cart, shipping_address(), PaymentMethod::CashOnDelivery)
            .await?;

        assert!(cart.is_empty());
        let keys = keys.lock().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1], "retry of the same cart reuses its key");
        Ok(())
    }

    #[tokio::test]
    async fn changed_cart_gets_a_fresh_key() -> anyhow::Result<()> {
        let keys = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&keys);
        let mut api = MockOrderApi::new();
        api.expect_submit_order().times(2).returning(move |_, key| {
            seen.lock().unwrap().push(key);
            Err(SubmitError::Timeout)
        });

        let mut cart = cart_with_total_300();
        let mut flow = CheckoutFlow::new(api);

        let _ = flow
            .submit(&mut cart, shipping_address(), PaymentMethod::BankTransfer)
            .await;
        cart.update_quantity("A", Some("250ml"), 1);
        let _ = flow
            .submit(&mut cart, shipping_address(), PaymentMethod::BankTransfer)
            .await;

        let keys = keys.lock().unwrap();
        assert_ne!(keys[0], keys[1]);
        Ok(())
    }

    #[tokio::test]
    async fn changed_address_or_payment_gets_a_fresh_key() -> anyhow::Result<()> {
        let seen_requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&seen_requests);
        let mut api = MockOrderApi::new();
        api.expect_submit_order().times(3).returning(move |request, key| {
            seen.lock().unwrap().push((
                key,
                request.payment_method,
                request.shipping_address.city.clone(),
            ));
            Err(SubmitError::Timeout)
        });

        let mut cart = cart_with_total_300();
        let mut flow = CheckoutFlow::new(api);

        let _ = flow
            .submit(&mut cart, shipping_address(), PaymentMethod::CashOnDelivery)
            .await;
        let mut moved = shipping_address();
        moved.city = "Ankara".into();
        let _ = flow
            .submit(&mut cart, moved.clone(), PaymentMethod::CashOnDelivery)
            .await;
        let _ = flow
            .submit(&mut cart, moved, PaymentMethod::CreditCard)
            .await;

        let seen = seen_requests.lock().unwrap();
        assert_eq!(seen[1].2, "Ankara");
        assert_eq!(seen[2].1, PaymentMethod::CreditCard);
        assert_ne!(seen[0].0, seen[1].0, "new city gets a new key");
        assert_ne!(seen[1].0, seen[2].0, "new payment method gets a new key");
        assert_eq!(cart.line_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn server_rejection_message_is_shown_verbatim() {
        let mut api = MockOrderApi::new();
        api.expect_submit_order().once().return_once(|_, _| {
            Err(SubmitError::ServerRejection {
                status: 400,
                message: "Insufficient stock for Rose Water".into(),
            })
        });

        let mut cart = cart_with_total_300();
        let mut flow = CheckoutFlow::new(api);
        let _ = flow
            .submit(&mut cart, shipping_address(), PaymentMethod::CreditCard)
            .await;

        match flow.state() {
            CheckoutState::Error { message, .. } => {
                assert_eq!(message, "Insufficient stock for Rose Water")
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(cart.line_count(), 1);
    }

    #[tokio::test]
    async fn invalid_shipping_blocks_submission() {
        let mut api = MockOrderApi::new();
        api.expect_submit_order().never();

        let mut cart = cart_with_total_300();
        let mut flow = CheckoutFlow::new(api);
        let mut address = shipping_address();
        address.email = "not-an-email".into();

        let result = flow
            .submit(&mut cart, address, PaymentMethod::CashOnDelivery)
            .await;

        assert!(matches!(result, Err(CheckoutError::Validation(_))));
        assert_eq!(flow.state(), &CheckoutState::Idle);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_any_request() {
        let mut api = MockOrderApi::new();
        api.expect_submit_order().never();

        let mut cart = CartStore::open(MemoryStorage::new());
        let mut flow = CheckoutFlow::new(api);

        let result = flow
            .submit(&mut cart, shipping_address(), PaymentMethod::CashOnDelivery)
            .await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn success_is_terminal() -> anyhow::Result<()> {
        let mut api = MockOrderApi::new();
        api.expect_submit_order()
            .once()
            .return_once(|_, _| Ok(confirmation("CL000125")));

        let mut cart = cart_with_total_300();
        let mut flow = CheckoutFlow::new(api);
        flow.submit(&mut cart, shipping_address(), PaymentMethod::CashOnDelivery)
            .await?;

        cart.add_item(
            CartItem::new("B", "Lavender Oil", Decimal::from(50)),
            NonZeroU32::new(1).unwrap(),
        );
        let again = flow
            .submit(&mut cart, shipping_address(), PaymentMethod::CashOnDelivery)
            .await;

        assert!(matches!(again, Err(CheckoutError::AlreadyCompleted)));
        assert_eq!(cart.line_count(), 1);
        Ok(())
    }
}
