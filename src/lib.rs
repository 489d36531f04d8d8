//! Decryption engine for the game's protected assets.
//!
//! Three independent container formats are handled:
//!
//! * resource archives (`.bytes`), see [`resource`];
//! * asset bundles with an encrypted descriptor and block index, see [`bundle`];
//! * sound banks, see [`sound`].
//!
//! The plaintext `global-metadata.dat` string table is readable through
//! [`metadata`].
//!
//! Every format exists in two platform variants, selected by [`Platform`].
//! The [`extract`] module ties them together over a directory tree.
#[macro_use]
extern crate anyhow;

pub mod bundle;
pub mod compression;
pub mod constants;
pub mod error;
pub mod extract;
pub mod hash;
pub mod keys;
pub mod metadata;
pub mod platform;
pub mod resource;
pub mod sound;

pub use error::{DecryptError, Result};
pub use platform::Platform;
