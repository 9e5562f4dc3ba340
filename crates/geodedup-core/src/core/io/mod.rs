//! Provides input/output functionality for the files a calculation directory holds.
//!
//! The geometry format is handled behind the [`traits::GeometryFile`] trait so that
//! callers can read from files, buffered readers or in-memory text alike. Calculation
//! headers are free text; everything the registry needs from them (the comparable
//! header prefix and the declared fragmentation) is extracted in [`header`].

pub mod header;
pub mod traits;
pub mod xyz;
