mod load;
mod parse;
mod record;

pub use load::{DataFormat, load_catalog};
pub use record::{Catalog, Record};
