pub mod directive;
pub mod rules;

pub use directive::{Directive, DirectiveExtractor, Extraction, SearchMode, extract};
pub use rules::{CommandLine, SubstitutionRule};
