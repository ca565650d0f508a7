//! Time and temperature dependent material cross sections
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod config;
mod error;
mod functional;
mod material;
mod precursor;
mod reference;
mod state;
mod stepper;
mod temperature;

// inline the important types for a nice public API
#[doc(inline)]
pub use functional::{sync_all, FunctionalMaterial};

#[doc(inline)]
pub use material::Material;

#[doc(inline)]
pub use reference::{ReferenceTable, TIME_TOLERANCE};

#[doc(inline)]
pub use temperature::{TemperatureModel, REFERENCE_TEMPERATURE};

#[doc(inline)]
pub use precursor::PrecursorStore;

#[doc(inline)]
pub use state::State;

#[doc(inline)]
pub use stepper::{StateClock, TimeStepper};

#[doc(inline)]
pub use config::{read_json, Flags, MaterialSpec};

#[doc(inline)]
pub use error::{Error, Result};
