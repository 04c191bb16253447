pub mod interface;
pub mod session;
pub mod wait;
pub mod chromium;
pub mod translator;
pub mod factory;

pub use interface::{TranslateInterface, TranslationRequest, TranslationResult};
pub use factory::TranslatorFactory;
