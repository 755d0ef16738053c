//! Core types for the persistence layer.
//!
//! - [`AssetFields`] - The descriptive, comparable fields of an asset
//! - [`StoredAsset`] - An asset row with persistence metadata
//! - [`NewAsset`], [`AssetUpdate`] - Write payloads
//! - [`HierarchyLink`] - A bare `(node, parent)` pair used for depth recomputation
//!
//! # Examples
//!
//! ```
//! use arbor_persistence::types::AssetFields;
//!
//! let fields = AssetFields::named("Feed Pump")
//!     .with_manufacturer("Grundfos")
//!     .with_serial_number("SN-4471");
//!
//! let pairs: Vec<_> = fields.comparable().collect();
//! assert_eq!(pairs[0], ("name", Some("Feed Pump")));
//! ```

mod stored_asset;

pub use stored_asset::{AssetFields, AssetUpdate, HierarchyLink, NewAsset, StoredAsset};
