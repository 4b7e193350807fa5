pub mod reference;

pub use reference::ReferenceDataService;
