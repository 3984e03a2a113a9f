pub mod adapter;
pub mod digikey;
pub mod federation;
pub mod lcsc;
pub mod octopart;

// Re-export for convenience
pub use adapter::{build_query, select_best_offer, SupplierAdapter, SupplierError};
pub use digikey::DigikeySupplier;
pub use federation::{SupplierFederation, SupplierStatus, DEFAULT_SUPPLIER_TIMEOUT};
pub use lcsc::LcscSupplier;
pub use octopart::OctopartSupplier;
