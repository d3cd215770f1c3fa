pub mod config;
pub use config::CoreConfig;

pub mod error;
pub use error::CoreError;

pub mod control;
pub use control::{ControlError, ProcessControl};

pub mod templates;
pub use templates::TemplateStore;

pub mod instances;
pub use instances::{InstanceRef, InstanceRegistry};

pub mod tail;
pub use tail::{TAIL_WINDOW, tail};

pub mod engine;
pub use engine::JobEngine;

mod fs;
