mod collection;

pub use collection::{CollectionStore, Record};
