//! # Permissions
//!
//! The permission vocabulary carried in access tokens, and the policy table
//! that decides which permission an operation requires.
//!
//! ## Policy Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              (resource, verb) ──► required permission                   │
//! │                                                                         │
//! │                 CREATE            VIEW            UPDATE          DELETE│
//! │  Client     CREATE_CLIENT     VIEW_CLIENT     UPDATE_CLIENT   DELETE_.. │
//! │  Product    CREATE_PRODUCT    VIEW_PRODUCT    UPDATE_PRODUCT  DELETE_.. │
//! │  Transaction CREATE_TRANS..   VIEW_TRANS..    UPDATE_TRANS..  DELETE_.. │
//! │                                                                         │
//! │  HTTP method ──► verb:  POST→CREATE  GET→VIEW  PUT/PATCH→UPDATE         │
//! │                         DELETE→DELETE                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Report generation is a read of transactions and therefore needs
//! `VIEW_TRANSACTION`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A resource guarded by the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Client,
    Product,
    Transaction,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Client => "client",
            Resource::Product => "product",
            Resource::Transaction => "transaction",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of operation being attempted on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    View,
    Update,
    Delete,
}

impl Verb {
    /// Maps an HTTP method name to a verb.
    ///
    /// HEAD is answered by the GET handlers, so it requires the view permission.
    /// Returns `None` for methods the API does not route, such as OPTIONS.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::permissions::Verb;
    ///
    /// assert_eq!(Verb::from_http_method("PATCH"), Some(Verb::Update));
    /// assert_eq!(Verb::from_http_method("HEAD"), Some(Verb::View));
    /// assert_eq!(Verb::from_http_method("OPTIONS"), None);
    /// ```
    pub fn from_http_method(method: &str) -> Option<Verb> {
        match method {
            "POST" => Some(Verb::Create),
            "GET" | "HEAD" => Some(Verb::View),
            "PUT" | "PATCH" => Some(Verb::Update),
            "DELETE" => Some(Verb::Delete),
            _ => None,
        }
    }
}

/// One of the 12 permission constants a token may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    CreateClient,
    ViewClient,
    UpdateClient,
    DeleteClient,
    CreateProduct,
    ViewProduct,
    UpdateProduct,
    DeleteProduct,
    CreateTransaction,
    ViewTransaction,
    UpdateTransaction,
    DeleteTransaction,
}

impl Permission {
    pub const ALL: [Permission; 12] = [
        Permission::CreateClient,
        Permission::ViewClient,
        Permission::UpdateClient,
        Permission::DeleteClient,
        Permission::CreateProduct,
        Permission::ViewProduct,
        Permission::UpdateProduct,
        Permission::DeleteProduct,
        Permission::CreateTransaction,
        Permission::ViewTransaction,
        Permission::UpdateTransaction,
        Permission::DeleteTransaction,
    ];

    /// Wire name as it appears in the token's `permissions` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateClient => "CREATE_CLIENT",
            Permission::ViewClient => "VIEW_CLIENT",
            Permission::UpdateClient => "UPDATE_CLIENT",
            Permission::DeleteClient => "DELETE_CLIENT",
            Permission::CreateProduct => "CREATE_PRODUCT",
            Permission::ViewProduct => "VIEW_PRODUCT",
            Permission::UpdateProduct => "UPDATE_PRODUCT",
            Permission::DeleteProduct => "DELETE_PRODUCT",
            Permission::CreateTransaction => "CREATE_TRANSACTION",
            Permission::ViewTransaction => "VIEW_TRANSACTION",
            Permission::UpdateTransaction => "UPDATE_TRANSACTION",
            Permission::DeleteTransaction => "DELETE_TRANSACTION",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for permission names outside the known vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// The policy table: which permission an operation needs.
///
/// ## Example
/// ```rust
/// use tienda_core::permissions::{required_permission, Permission, Resource, Verb};
///
/// assert_eq!(
///     required_permission(Resource::Transaction, Verb::Create),
///     Permission::CreateTransaction
/// );
/// ```
pub fn required_permission(resource: Resource, verb: Verb) -> Permission {
    match (resource, verb) {
        (Resource::Client, Verb::Create) => Permission::CreateClient,
        (Resource::Client, Verb::View) => Permission::ViewClient,
        (Resource::Client, Verb::Update) => Permission::UpdateClient,
        (Resource::Client, Verb::Delete) => Permission::DeleteClient,
        (Resource::Product, Verb::Create) => Permission::CreateProduct,
        (Resource::Product, Verb::View) => Permission::ViewProduct,
        (Resource::Product, Verb::Update) => Permission::UpdateProduct,
        (Resource::Product, Verb::Delete) => Permission::DeleteProduct,
        (Resource::Transaction, Verb::Create) => Permission::CreateTransaction,
        (Resource::Transaction, Verb::View) => Permission::ViewTransaction,
        (Resource::Transaction, Verb::Update) => Permission::UpdateTransaction,
        (Resource::Transaction, Verb::Delete) => Permission::DeleteTransaction,
    }
}

/// Parses a token's permission claim, dropping names it does not recognize.
pub fn parse_permissions<I, S>(names: I) -> Vec<Permission>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| name.as_ref().parse().ok())
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
