mod deployment;
mod devices;
mod links;
mod ordered;
mod templates;

pub use deployment::*;
pub use devices::*;
pub use links::*;
pub use ordered::OrderedMap;
pub use templates::*;
