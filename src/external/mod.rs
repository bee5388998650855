//! External collaborator interfaces.
//!
//! Every call that leaves the engine goes through one of the narrow
//! capabilities here: price gateways, the debt-token ledger, and collateral
//! custody. Production and test implementations are interchangeable behind
//! these traits.

pub mod custody;
pub mod oracle;
pub mod token;

pub use custody::{CollateralCustody, InMemoryCollateralVault};
pub use oracle::{PriceHandle, PriceRound, PriceSource, StaticPriceSource};
pub use token::{DebtToken, InMemoryDebtToken};
