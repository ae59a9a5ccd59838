use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{cart::CartLine, models::PaymentMethod};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[validate(custom(function = "not_blank", message = "Full name is required"))]
    pub full_name: String,
    #[validate(
        custom(function = "not_blank", message = "Email is required"),
        email(message = "Email address is invalid")
    )]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "Phone is required"))]
    pub phone: String,
    #[validate(custom(function = "not_blank", message = "Address is required"))]
    pub address: String,
    #[validate(custom(function = "not_blank", message = "City is required"))]
    pub city: String,
    #[validate(custom(function = "not_blank", message = "District is required"))]
    pub district: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Body of `POST /api/orders`: a snapshot of the cart plus checkout form data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[validate(length(min = 1, message = "Cart is empty"))]
    pub items: Vec<CartLine>,
    pub total: Decimal,
    #[validate(nested)]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

impl OrderRequest {
    /// Σ(unit price × quantity) over `items`, or `None` on overflow.
    pub fn items_total(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |sum, line| {
            sum.checked_add(line.checked_line_total()?)
        })
    }
}


#[cfg(test)]
mod tests {
    use super::{fixtures::shipping_address, *};

    #[test]
    fn complete_address_is_valid() {
        assert!(shipping_address().validate().is_ok());
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut address = shipping_address();
        address.city = "   ".into();
        address.phone = String::new();

        let errors = address.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("city"));
        assert!(fields.contains_key("phone"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut address = shipping_address();
        address.email = "ayse.example.com".into();

        let errors = address.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn deserializes_camel_case_body() {
        let body = serde_json::json!({
            "items": [{"productId": "A", "name": "Rose Water", "unitPrice": 100, "quantity": 3, "sizeVariant": "250ml"}],
            "total": 300,
            "shippingAddress": {
                "fullName": "Ayşe Yılmaz",
                "email": "ayse@example.com",
                "phone": "+90 555 000 00 00",
                "address": "Bağdat Cd. 12",
                "city": "Istanbul",
                "district": "Kadıköy"
            },
            "paymentMethod": "cash_on_delivery"
        });

        let request: OrderRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(request.items_total(), Some(request.total));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn items_total_is_none_on_overflow() {
        let big: Decimal = "50000000000000000000000000000".parse().unwrap();
        let line = CartLine {
            product_id: "A".into(),
            name: "Gold Leaf".into(),
            unit_price: big,
            quantity: 1,
            size_variant: None,
            image_ref: String::new(),
        };
        let request = OrderRequest {
            items: vec![line.clone(), line],
            total: Decimal::ZERO,
            shipping_address: shipping_address(),
            payment_method: PaymentMethod::CashOnDelivery,
        };

        assert_eq!(request.items_total(), None);
    }
}
