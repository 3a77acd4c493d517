//! Static lookup tables shared by the transcoder.

pub mod maps;
