//! Adapter for the external TOON encoder.
//!
//! Janusz does not implement TOON itself. [`probe::probe`] finds a way to run
//! the `toon` command line tool and [`encoder::ToonEncoder`] drives it with a
//! timeout on every invocation.

pub mod encoder;
pub mod probe;

pub use encoder::{
    collect_records, EncodeFailure, EncodeOptions, EncodeOutcome, EncodeReport, ToonEncoder,
};
pub use probe::{probe, EncoderAvailability, ProbeOptions};
