//! I/O seams: mesh/model input, snapshot output, receiver traces.
//!
//! The engine consumes meshes through the narrow [`crate::mesh::MeshData`]
//! interface; the Exodus reader (feature `exodus`) fills it from NetCDF,
//! and the builders fill it programmatically. Movie frames and source
//! catalogs use HDF5 behind the `hdf5-io` feature. The receiver trace
//! writer is plain text and always available.

#[cfg(feature = "exodus")]
pub mod exodus;
#[cfg(feature = "hdf5-io")]
pub mod snapshot;
pub mod traces;

pub use traces::write_traces;
