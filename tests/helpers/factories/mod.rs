pub mod entry_factory;
pub mod run_factory;

pub use entry_factory::{EntryFactory, key};
pub use run_factory::RunFactory;

#[cfg(test)]
mod entry_factory_test;
#[cfg(test)]
mod run_factory_test;
