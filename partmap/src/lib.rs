//! Partmap - component-to-part resolution library
//!
//! Turns abstract component descriptions ("resistor, 10k, 0603") into
//! concrete, purchasable parts with a manufacturer part number, supplier
//! catalog number, price and stock.
//!
//! # Quick Start
//!
//! ```no_run
//! use partmap::{ComponentMapper, ComponentSpec, MapperConfig};
//!
//! # async fn run() -> Result<(), partmap::PartmapError> {
//! let mapper = ComponentMapper::new(&MapperConfig::from_env())?;
//! let spec = ComponentSpec::new("resistor").with_value("10k").with_package("0603");
//!
//! let result = mapper.map_component(&spec).await;
//! println!("{} ({}) confidence {:.2}", result.primary.mpn, result.primary.supplier_pn, result.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Value normalization**: `10k`, `10K ohm`, `10kΩ` and `4k7` style spellings compare equal
//! - **Local knowledge base**: curated common parts, answered without network access
//! - **Supplier federation**: LCSC, Octopart and Digi-Key searched concurrently, each optional
//! - **Deterministic ranking**: weighted scoring with stable tie-breaking
//! - **Result cache**: one JSON document per spec, written atomically

pub mod cache;
pub mod core;
pub mod library;
pub mod normalize;
pub mod schema;
pub mod scorer;
pub mod suppliers;

// Re-export main types
pub use cache::{cache_key, CacheError, ResultCache};
pub use core::{ComponentMapper, MapperConfig, PartmapError, LOCAL_CONFIDENCE_THRESHOLD};
pub use library::{ComponentLibrary, LibraryError, LocalMatcher};
pub use normalize::{normalize, values_match};
pub use schema::{ComponentSpec, MappingResult, PhysicalComponent, UNKNOWN_MPN};
pub use scorer::{packages_compatible, score, select_best_match};
pub use suppliers::{SupplierAdapter, SupplierError, SupplierFederation, SupplierStatus};

/// Resolve one spec with a throwaway mapper built from `config`.
pub async fn map_component(
    config: &MapperConfig,
    spec: &ComponentSpec,
) -> Result<MappingResult, PartmapError> {
    let mapper = ComponentMapper::new(config)?;
    Ok(mapper.map_component(spec).await)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ComponentMapper, ComponentSpec, MapperConfig, MappingResult, PartmapError,
        PhysicalComponent, SupplierAdapter, SupplierError,
    };
}
