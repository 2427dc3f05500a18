//! gRPC/protobuf generated code
//!
//! The bindings are checked in; the build script regenerates them when the
//! proto source is present.

/// Generated bindings for the `skein.v1` gateway protocol.
pub mod skein_v1 {
    #![allow(clippy::all)]
    include!("skein.v1.rs");
}
