pub mod dom;
pub mod js_executor;
pub mod locator;

pub use dom::Dom;
pub use js_executor::JsExecutor;
pub use locator::{Locator, LocatorChain, Role, TextPattern};
