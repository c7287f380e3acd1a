// remote2local/src/transfer/mod.rs
pub(crate) mod archive; // Unpacking the distribution tarball
pub(crate) mod download; // Streaming artifact downloads

pub use archive::extract_distribution;
pub use download::download_to_file;
