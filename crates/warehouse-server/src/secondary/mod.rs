//! Secondary outputs: listing, download and group-analysis launches.

pub mod download;
pub mod launch;
pub mod list;
pub mod path;

pub use download::{Download, prepare_download};
pub use launch::{LaunchRequest, launch};
pub use list::{SecondaryOutput, flatten, list};
