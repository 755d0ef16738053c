//! Tenant scoping for asset storage.
//!
//! Every asset belongs to exactly one tenant (a company). All uniqueness
//! checks, hierarchy traversals and writes are scoped to a single
//! [`TenantId`]; the store traits take one as a mandatory argument and no
//! operation spans tenants.
//!
//! ```
//! use arbor_persistence::tenant::TenantId;
//!
//! let tenant = TenantId::new("acme-mining");
//! assert_eq!(tenant.as_str(), "acme-mining");
//! assert_eq!(tenant.to_string(), "acme-mining");
//! ```

mod id;

pub use id::TenantId;
