//! Orders
//!
//! Checkout preconditions and the order-creation request handed to the external order
//! service.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    /// Recipient name
    pub full_name: String,

    /// Contact email
    pub email: String,

    /// Contact phone
    pub phone: String,

    /// Street address
    pub street: String,

    /// City
    pub city: String,

    /// State or province
    pub state: String,

    /// Postal code
    pub postal_code: String,

    /// Country
    pub country: String,
}

impl Address {
    fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::FullName => &self.full_name,
            AddressField::Email => &self.email,
            AddressField::Phone => &self.phone,
            AddressField::Street => &self.street,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::PostalCode => &self.postal_code,
        }
    }

    fn first_missing(&self, required: &[AddressField]) -> Option<AddressField> {
        required
            .iter()
            .copied()
            .find(|field| self.field(*field).trim().is_empty())
    }

    /// Returns `true` when both addresses point at the same place.
    ///
    /// Street, city and postal code are compared ignoring case and whitespace.
    pub fn same_location(&self, other: &Self) -> bool {
        [AddressField::Street, AddressField::City, AddressField::PostalCode]
            .into_iter()
            .all(|field| normalize(self.field(field)) == normalize(other.field(field)))
    }
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A required address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    /// Recipient name
    FullName,
    /// Contact email
    Email,
    /// Contact phone
    Phone,
    /// Street address
    Street,
    /// City
    City,
    /// State or province
    State,
    /// Postal code
    PostalCode,
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FullName => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Street => "street",
            Self::City => "city",
            Self::State => "state",
            Self::PostalCode => "postal code",
        })
    }
}

const SHIPPING_FIELDS: [AddressField; 7] = [
    AddressField::FullName,
    AddressField::Email,
    AddressField::Phone,
    AddressField::Street,
    AddressField::City,
    AddressField::State,
    AddressField::PostalCode,
];

const CUSTOMER_FIELDS: [AddressField; 6] = [
    AddressField::FullName,
    AddressField::Phone,
    AddressField::Street,
    AddressField::City,
    AddressField::State,
    AddressField::PostalCode,
];

/// Why a checkout cannot be submitted. Only the first failure is reported.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OrderValidationError {
    /// A shipping address field is blank.
    #[error("missing required field: {0}")]
    MissingField(AddressField),

    /// The terms were not accepted.
    #[error("terms and conditions must be accepted")]
    TermsNotAccepted,

    /// A dropshipping customer address field is blank.
    #[error("missing required customer field: {0}")]
    MissingCustomerField(AddressField),

    /// The dropshipping customer address is the buyer's own address.
    #[error("customer address must differ from the shipping address")]
    CustomerAddressNotDistinct,
}

/// Dropshipping redirection data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropshippingDetails {
    /// End customer the supplier ships to
    pub customer_address: Address,

    /// Delivery instructions for the supplier
    pub instructions: Option<String>,
}

/// What the buyer filled in at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    /// Buyer's shipping address
    pub shipping_address: Address,

    /// Selected payment method identifier
    pub payment_method: String,

    /// Selected shipping method
    pub shipping_method: String,

    /// Order notes
    pub notes: Option<String>,

    /// Whether the terms were accepted
    pub terms_accepted: bool,

    /// Present when the order is dropshipped
    pub dropshipping: Option<DropshippingDetails>,
}

/// The order-creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Buyer's shipping address
    pub shipping_address: Address,

    /// Selected payment method identifier
    #[serde(default)]
    pub payment_method: String,

    /// Selected shipping method
    #[serde(default)]
    pub shipping_method: String,

    /// Order notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Whether the order is dropshipped
    #[serde(default)]
    pub is_dropshipping: bool,

    /// End customer address, when dropshipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_address: Option<Address>,

    /// Delivery instructions, when dropshipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropshipping_instructions: Option<String>,
}

impl CheckoutRequest {
    /// Re-check a request received from elsewhere. Terms acceptance is not part of the
    /// request and is assumed to have been checked when it was built.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderValidationError`] found.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        validate_shipping(&self.shipping_address)?;

        if self.is_dropshipping {
            let customer = self
                .customer_address
                .as_ref()
                .ok_or(OrderValidationError::MissingCustomerField(
                    AddressField::FullName,
                ))?;

            validate_customer(&self.shipping_address, customer)?;
        }

        Ok(())
    }
}

fn validate_shipping(address: &Address) -> Result<(), OrderValidationError> {
    match address.first_missing(&SHIPPING_FIELDS) {
        Some(field) => Err(OrderValidationError::MissingField(field)),
        None => Ok(()),
    }
}

fn validate_customer(shipping: &Address, customer: &Address) -> Result<(), OrderValidationError> {
    if let Some(field) = customer.first_missing(&CUSTOMER_FIELDS) {
        return Err(OrderValidationError::MissingCustomerField(field));
    }

    if customer.same_location(shipping) {
        return Err(OrderValidationError::CustomerAddressNotDistinct);
    }

    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Validate a checkout form and build the order-creation request.
///
/// Checks run in order: shipping address fields, terms acceptance, then (when
/// dropshipping) the customer address fields and that the customer address is not the
/// buyer's own.
///
/// # Errors
///
/// Returns the first [`OrderValidationError`] found.
pub fn materialize(form: CheckoutForm) -> Result<CheckoutRequest, OrderValidationError> {
    validate_shipping(&form.shipping_address)?;

    if !form.terms_accepted {
        return Err(OrderValidationError::TermsNotAccepted);
    }

    if let Some(dropshipping) = &form.dropshipping {
        validate_customer(&form.shipping_address, &dropshipping.customer_address)?;
    }

    let (is_dropshipping, customer_address, dropshipping_instructions) = match form.dropshipping {
        Some(details) => (
            true,
            Some(details.customer_address),
            non_blank(details.instructions),
        ),
        None => (false, None, None),
    };

    Ok(CheckoutRequest {
        shipping_address: form.shipping_address,
        payment_method: form.payment_method.trim().to_owned(),
        shipping_method: form.shipping_method.trim().to_owned(),
        notes: non_blank(form.notes),
        is_dropshipping,
        customer_address,
        dropshipping_instructions,
    })
}
