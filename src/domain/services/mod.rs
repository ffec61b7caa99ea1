//! Domain services - Pure selection and merging rules
//!
//! Every function takes its random source as a parameter; nothing here
//! touches I/O.

mod attribute_selector;
mod contribution;
mod options_resolver;
mod species_selector;
mod type_selector;

pub use attribute_selector::AttributeSelector;
pub use contribution::{contribution_shares, ContributionShare};
pub use options_resolver::{OptionsResolver, OVERRIDE_FIELDS};
pub use species_selector::SpeciesSelector;
pub use type_selector::TypeSelector;
