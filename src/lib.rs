#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate keeps track of a fleet of OctoPrint (and Klipper) printers:
//! the profiles used to reach them, which one is the default, and a live
//! dashboard of what every printer is doing.

pub mod camera;
pub mod config;
pub mod dashboard;
pub mod store;

pub use config::Config;
pub use dashboard::{Dashboard, OctoPrintSource, RenderMode, Selection, StatusSource};
pub use store::{NewPrinter, PrinterProfile, PrinterStore, ProfileId, StoreError};
