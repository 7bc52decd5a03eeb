//! Helpers for presentation models: display converters, change
//! notifications, commands and observable lists.

pub mod command;
pub mod converters;
pub mod notifier;
pub mod observable;

pub use command::Command;
pub use converters::{DateFormatConverter, DefaultConverter, DurationFormatConverter, Value};
pub use notifier::{Notification, Notifier};
pub use observable::{CollectionChange, ObservableVec};
