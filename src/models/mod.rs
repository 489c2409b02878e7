pub mod stock;
pub mod industry;
pub mod reference;
pub mod response;

pub use stock::*;
pub use industry::*;
pub use reference::*;
pub use response::*;
