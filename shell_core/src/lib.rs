//! # shell_core - Shell Property Cards
//!
//! `shell_core` reads, derives, and writes the shell element property cards
//! of a NASTRAN bulk data deck: PSHELL, PSHEAR, PCOMP, PCOMPG and PLPLANE.
//! Every record type is JSON-serializable, so records can be stored or sent
//! between tools without a text deck.
//!
//! ## Design Philosophy
//!
//! - **Typed fields**: positional tokens are coerced through one set of accessors
//! - **Explicit references**: a material slot is either an id or a resolved handle
//! - **Rich Errors**: structured error types carrying card, pid, field and ply
//! - **No global state**: records are plain values, the registry is passed in
//!
//! ## Quick Start
//!
//! ```rust
//! use shell_core::fields::BdfCard;
//! use shell_core::materials::{Material, MaterialKind, ModelRegistry};
//! use shell_core::properties::ShellProperty;
//!
//! let card: BdfCard = serde_json::from_str(
//!     r#"["PCOMP", 701512, null, 0.01, null, null, null, null, "SYM",
//!         300704, 0.037, 0.0, "YES", 300704, 0.037, 45.0, "YES"]"#,
//! ).unwrap();
//! let mut prop = ShellProperty::parse(&card).unwrap();
//!
//! let registry = ModelRegistry::from_materials([
//!     Material::new(300704, MaterialKind::Mat8).with_density(1.5),
//! ]);
//! prop.cross_reference(&registry).unwrap();
//!
//! assert!((prop.thickness().unwrap() - 0.148).abs() < 1e-12);
//! assert!((prop.mass_per_area().unwrap() - (1.5 * 0.148 + 0.01)).abs() < 1e-12);
//! ```
//!
//! ## Modules
//!
//! - [`fields`] - Positional field access, token coercion and output helpers
//! - [`properties`] - The five property records and the [`ShellProperty`] union
//! - [`plies`] - Ply stack, symmetry and non-structural mass smearing
//! - [`xref`] - Two-state foreign keys and the cross-reference resolver
//! - [`materials`] - Material entries and the id registry
//! - [`settings`] - Codec options
//! - [`errors`] - Structured error types

pub mod errors;
pub mod fields;
pub mod materials;
pub mod plies;
pub mod properties;
pub mod settings;
pub mod xref;

// Re-export commonly used types at crate root for convenience
pub use errors::{PropResult, PropertyError};
pub use fields::{BdfCard, CardPrinter, Field, FieldSource, FieldWidth};
pub use materials::{Material, MaterialKind, ModelRegistry, Registry};
pub use plies::{PlySelect, SmearMethod};
pub use properties::ShellProperty;
pub use settings::Settings;
