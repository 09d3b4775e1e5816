//! Plan tier reference data and quota validation.
//!
//! # Module Structure
//!
//! - `plan` - Plan reference data struct
//! - `catalog` - Static PlanCatalog lookup
//! - `quota` - Pure quota validation functions

mod catalog;
mod plan;
pub mod quota;

pub use catalog::PlanCatalog;
pub use plan::Plan;
pub use quota::{PetAddCheck, QuotaCheck};
